use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Table name cannot be empty")]
    EmptyTableName,

    #[error("Default ttl must be positive")]
    NonPositiveTtl,
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreType {
    #[default]
    DynamoDb,
    /// Items live only as long as the process. Local use only.
    Memory,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub table_name: String,
    pub backend: StoreType,
    /// Lifetime of a created item when the request names none
    pub default_ttl_seconds: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            table_name: "t5-test-todo".to_string(),
            backend: StoreType::default(),
            default_ttl_seconds: 3600,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.table_name.is_empty() {
            return Err(ValidationError::EmptyTableName);
        }
        if self.default_ttl_seconds <= 0 {
            return Err(ValidationError::NonPositiveTtl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, StoreType::DynamoDb);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse() {
        let yaml = r#"
table_name: todos
backend:
  type: memory
default_ttl_seconds: 60
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.table_name, "todos");
        assert_eq!(config.backend, StoreType::Memory);
        assert_eq!(config.default_ttl_seconds, 60);

        let config: Config = serde_yaml::from_str("backend:\n  type: dynamodb\n").unwrap();
        assert_eq!(config.backend, StoreType::DynamoDb);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.table_name = String::new();
        assert_eq!(config.validate(), Err(ValidationError::EmptyTableName));

        let mut config = Config::default();
        config.default_ttl_seconds = 0;
        assert_eq!(config.validate(), Err(ValidationError::NonPositiveTtl));
    }
}
