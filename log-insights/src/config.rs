use crate::poller::PollPolicy;
use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Log group cannot be empty")]
    EmptyLogGroup,

    #[error("Lookback window cannot be 0 hours")]
    ZeroLookback,

    #[error("Poll interval cannot be 0")]
    ZeroPollInterval,

    #[error("Poll attempts cannot be 0, use null for unbounded polling")]
    ZeroPollAttempts,
}

/// Log search backend the endpoint queries
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum BackendType {
    #[default]
    CloudWatch,
    /// Keeps lines written through this process in memory. Local use only.
    Memory {
        #[serde(default = "default_memory_capacity")]
        capacity: usize,
    },
}

fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_group: String,
    pub backend: BackendType,
    /// Size of the trailing search window
    pub lookback_hours: u32,
    pub poll: PollPolicy,
    /// Return backend error text to callers instead of a generic message
    pub expose_backend_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_group: "/aws/lambda/api-log".to_string(),
            backend: BackendType::default(),
            lookback_hours: 24,
            poll: PollPolicy::default(),
            expose_backend_errors: true,
        }
    }
}

impl Config {
    pub fn lookback(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.lookback_hours))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.log_group.is_empty() {
            return Err(ValidationError::EmptyLogGroup);
        }
        if self.lookback_hours == 0 {
            return Err(ValidationError::ZeroLookback);
        }
        if self.poll.interval_ms == 0 {
            return Err(ValidationError::ZeroPollInterval);
        }
        if self.poll.max_attempts == Some(0) {
            return Err(ValidationError::ZeroPollAttempts);
        }
        Ok(())
    }
}
