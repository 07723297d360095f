use serde::Deserialize;
use thiserror::Error;

/// Upper bound the queue service puts on one receive call.
pub const MAX_MESSAGES_PER_RECEIVE: i32 = 10;
pub const MAX_WAIT_TIME_SECS: i32 = 20;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("queue_url is required for the sqs backend")]
    MissingQueueUrl,

    #[error("receive.max_messages must be between 1 and {MAX_MESSAGES_PER_RECEIVE}, got {0}")]
    MaxMessagesOutOfRange(i32),

    #[error("receive.wait_time_secs must be between 0 and {MAX_WAIT_TIME_SECS}, got {0}")]
    WaitTimeOutOfRange(i32),

    #[error("visibility timeouts cannot be negative")]
    NegativeVisibilityTimeout,
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum QueueType {
    #[default]
    Sqs,
    /// In-process queue. Local use only.
    Memory,
}

/// Parameters of every receive call.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ReceiveOptions {
    pub max_messages: i32,
    /// How long received messages stay hidden from other receivers
    pub visibility_timeout_secs: i32,
    pub wait_time_secs: i32,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        ReceiveOptions {
            max_messages: 1,
            visibility_timeout_secs: 20,
            wait_time_secs: 0,
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub queue_url: String,
    pub backend: QueueType,
    pub receive: ReceiveOptions,
    /// Used when a visibility change names no timeout
    pub default_visibility_timeout_secs: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            queue_url: String::new(),
            backend: QueueType::default(),
            receive: ReceiveOptions::default(),
            default_visibility_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == QueueType::Sqs && self.queue_url.is_empty() {
            return Err(ValidationError::MissingQueueUrl);
        }
        let max_messages = self.receive.max_messages;
        if !(1..=MAX_MESSAGES_PER_RECEIVE).contains(&max_messages) {
            return Err(ValidationError::MaxMessagesOutOfRange(max_messages));
        }
        let wait = self.receive.wait_time_secs;
        if !(0..=MAX_WAIT_TIME_SECS).contains(&wait) {
            return Err(ValidationError::WaitTimeOutOfRange(wait));
        }
        if self.receive.visibility_timeout_secs < 0 || self.default_visibility_timeout_secs < 0 {
            return Err(ValidationError::NegativeVisibilityTimeout);
        }
        Ok(())
    }
}
