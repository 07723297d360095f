use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

#[derive(Deserialize, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "gateway".to_string()
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level, used when `RUST_LOG` is not set
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            sentry_dsn: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub listener: Listener,
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    pub log_api: log_insights::config::Config,
    pub weather: weather::config::Config,
    /// Optional endpoints, only mounted when configured
    pub todo: Option<todo::config::Config>,
    pub notify: Option<notify::config::Config>,
    pub queue: Option<queue::config::Config>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        tracing::Level::from_str(&self.logging.level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.logging.level.clone()))?;
        if let Some(dsn) = &self.logging.sentry_dsn {
            sentry::types::Dsn::from_str(dsn)
                .map_err(|e| ConfigError::InvalidSentryDsn(e.to_string()))?;
        }
        self.log_api.validate()?;
        self.weather.validate()?;
        if let Some(todo) = &self.todo {
            todo.validate()?;
        }
        if let Some(notify) = &self.notify {
            notify.validate()?;
        }
        if let Some(queue) = &self.queue {
            queue.validate()?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("invalid sentry dsn: {0}")]
    InvalidSentryDsn(String),
    #[error("invalid log_api config: {0}")]
    LogApi(#[from] log_insights::config::ValidationError),
    #[error("invalid weather config: {0}")]
    Weather(#[from] weather::config::ValidationError),
    #[error("invalid todo config: {0}")]
    Todo(#[from] todo::config::ValidationError),
    #[error("invalid notify config: {0}")]
    Notify(#[from] notify::config::ValidationError),
    #[error("invalid queue config: {0}")]
    Queue(#[from] queue::config::ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use log_insights::config::BackendType;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn empty_config_uses_defaults() {
        let tmp = write_tmp_file("{}");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.is_none());
        assert_eq!(config.log_api.log_group, "/aws/lambda/api-log");
        assert_eq!(config.weather.default_city, "Buenos Aires");
        assert!(config.todo.is_none());
        assert!(config.notify.is_none());
        assert!(config.queue.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 8080
            logging:
                level: debug
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            log_api:
                log_group: /aws/lambda/other
                backend:
                    type: memory
                lookback_hours: 6
                poll:
                    interval_ms: 250
                    max_attempts: null
                expose_backend_errors: false
            weather:
                default_city: London
            todo:
                table_name: todos
            notify:
                topic_arn: arn:aws:sns:us-east-1:123456789012:demo
            queue:
                backend:
                    type: memory
                receive:
                    max_messages: 5
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.listener.port, 8080);
        let metrics = config.metrics.as_ref().expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "gateway");
        assert_eq!(config.log_api.log_group, "/aws/lambda/other");
        assert_eq!(
            config.log_api.backend,
            BackendType::Memory { capacity: 10_000 }
        );
        assert_eq!(config.log_api.poll.max_attempts, None);
        assert!(!config.log_api.expose_backend_errors);
        assert_eq!(config.weather.default_city, "London");
        let todo = config.todo.as_ref().expect("todo config");
        assert_eq!(todo.table_name, "todos");
        assert_eq!(todo.default_ttl_seconds, 3600);
        let notify = config.notify.as_ref().expect("notify config");
        assert_eq!(notify.topic_arn, "arn:aws:sns:us-east-1:123456789012:demo");
        let queue = config.queue.as_ref().expect("queue config");
        assert_eq!(queue.backend, queue::config::QueueType::Memory);
        assert_eq!(queue.receive.max_messages, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/gateway.yaml"));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn validation_errors() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel(_))
        ));

        let mut config = Config::default();
        config.logging.sentry_dsn = Some("not a dsn".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSentryDsn(_))
        ));

        let mut config = Config::default();
        config.log_api.lookback_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::LogApi(_))));

        let mut config = Config::default();
        config.weather.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Weather(_))));
    }

    #[test]
    fn optional_sections_are_validated_when_present() {
        let mut config = Config::default();
        config.todo = Some(todo::config::Config {
            table_name: String::new(),
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(ConfigError::Todo(_))));

        let mut config = Config::default();
        config.notify = Some(notify::config::Config::default());
        assert!(matches!(config.validate(), Err(ConfigError::Notify(_))));

        let mut config = Config::default();
        config.queue = Some(queue::config::Config::default());
        assert!(matches!(config.validate(), Err(ConfigError::Queue(_))));
    }
}
