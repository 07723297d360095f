use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("topic_arn is required for the sns backend")]
    MissingTopicArn,
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum TopicType {
    #[default]
    Sns,
    /// Records messages and subscriptions in process. Local use only.
    Memory,
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub topic_arn: String,
    pub backend: TopicType,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == TopicType::Sns && self.topic_arn.is_empty() {
            return Err(ValidationError::MissingTopicArn);
        }
        Ok(())
    }
}
