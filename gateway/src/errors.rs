use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),

    #[error("could not install metrics recorder: {0}")]
    MetricsRecorder(String),

    #[error("could not build weather client: {0}")]
    Weather(#[from] weather::WeatherError),

    #[error("lambda runtime failed: {0}")]
    Lambda(String),
}
