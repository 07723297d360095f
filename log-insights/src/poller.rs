use crate::backend::{LogSearchBackend, QueryHandle, QueryResult};
use crate::errors::{LogQueryError, Result};
use crate::metrics_defs::QUERY_POLLS;
use serde::Deserialize;
use shared::histogram;
use tokio::time::{Duration, sleep};

const DEFAULT_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// How often and how long to wait for a submitted query.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollPolicy {
    /// Pause between two result fetches
    pub interval_ms: u64,
    /// Fetch budget per query. `None` polls until the backend reports a
    /// terminal status, bounded only by the surrounding execution limit.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval_ms: DEFAULT_INTERVAL_MS,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl PollPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Fetches the result for `handle` until its status is terminal.
///
/// Fetches are strictly sequential and separated by the policy interval.
/// Never returns a non-terminal result: running out of attempts is reported as
/// [`LogQueryError::QueryTimedOut`].
pub async fn poll_until_terminal(
    backend: &dyn LogSearchBackend,
    handle: &QueryHandle,
    policy: &PollPolicy,
) -> Result<QueryResult> {
    let mut attempts: u32 = 0;

    loop {
        let result = backend.get_query_result(handle).await?;
        attempts += 1;
        tracing::info!(query_id = %handle, status = %result.status, attempts, "Query status");

        if result.status.is_terminal() {
            histogram!(QUERY_POLLS).record(f64::from(attempts));
            return Ok(result);
        }

        if let Some(max_attempts) = policy.max_attempts
            && attempts >= max_attempts
        {
            tracing::warn!(query_id = %handle, attempts, "Giving up on query");
            return Err(LogQueryError::QueryTimedOut {
                handle: handle.to_string(),
                attempts,
            });
        }

        sleep(policy.interval()).await;
    }
}
