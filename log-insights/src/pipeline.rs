use crate::backend::{LogSearchBackend, QueryStatus};
use crate::config::Config;
use crate::errors::Result;
use crate::metrics_defs::{QUERIES_SUBMITTED, QUERY_OUTCOMES};
use crate::poller::{PollPolicy, poll_until_terminal};
use crate::query::{InsightsQuery, QueryRequest};
use crate::records::{LogRecord, normalize, sort_newest_first};
use chrono::{DateTime, TimeDelta, Utc};
use shared::counter;
use std::sync::Arc;

/// Submit, poll, fold and sort: everything behind `GET` on the log endpoint.
pub struct LogPipeline {
    backend: Arc<dyn LogSearchBackend>,
    log_group: String,
    lookback: TimeDelta,
    query: InsightsQuery,
    poll: PollPolicy,
}

impl LogPipeline {
    pub fn new(backend: Arc<dyn LogSearchBackend>, config: &Config) -> Self {
        LogPipeline {
            backend,
            log_group: config.log_group.clone(),
            lookback: config.lookback(),
            query: InsightsQuery::access_log(),
            poll: config.poll.clone(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns the newest access log records in the window ending at `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<Vec<LogRecord>> {
        let request = QueryRequest::trailing(&self.log_group, now, self.lookback, &self.query);
        tracing::info!(
            log_group = %request.log_group,
            start = request.time_window_start,
            end = request.time_window_end,
            "Running Logs Insights query"
        );

        let handle = self.backend.submit_query(&request).await?;
        counter!(QUERIES_SUBMITTED, "backend" => self.backend.name()).increment(1);
        tracing::info!(query_id = %handle, "Started query");

        let result = poll_until_terminal(self.backend.as_ref(), &handle, &self.poll).await?;
        counter!(QUERY_OUTCOMES, "status" => result.status.to_string()).increment(1);
        if result.status != QueryStatus::Complete {
            tracing::warn!(query_id = %handle, status = %result.status, "Query did not complete");
        }
        tracing::info!(query_id = %handle, count = result.rows.len(), "Query result count");

        Ok(sort_newest_first(normalize(result.rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, ResultField, Row};
    use crate::errors::LogQueryError;
    use crate::testutils::{ScriptedBackend, fast_policy};
    use chrono::TimeZone;

    fn config() -> Config {
        Config {
            poll: fast_policy(None),
            ..Config::default()
        }
    }

    fn row(ts: &str, ip: &str, event: &str, page: &str) -> Row {
        vec![
            ResultField::new("@timestamp", ts),
            ResultField::new("ip", ip),
            ResultField::new("event", event),
            ResultField::new("page", page),
        ]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_run_submits_access_log_query_over_trailing_day() {
        let backend = Arc::new(ScriptedBackend::completing_with(vec![]));
        let pipeline = LogPipeline::new(backend.clone(), &config());
        pipeline.run(now()).await.unwrap();

        let submitted = backend.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].log_group, "/aws/lambda/api-log");
        assert_eq!(submitted[0].time_window_end, now().timestamp_millis());
        assert_eq!(
            submitted[0].time_window_start,
            (now() - TimeDelta::hours(24)).timestamp_millis()
        );
        assert!(submitted[0].query_text.contains("limit 25"));
        assert!(
            submitted[0]
                .query_text
                .contains(r#"filter ispresent(ip) and ip != "unknown""#)
        );
    }

    #[tokio::test]
    async fn test_run_reorders_backend_rows() {
        // Rows as they come back after the backend filter, out of order
        let backend = Arc::new(ScriptedBackend::new(
            vec![
                QueryStatus::Pending("Scheduled".into()),
                QueryStatus::Pending("Running".into()),
                QueryStatus::Complete,
            ],
            vec![
                row("2025-01-01T00:00:00", "5.6.7.8", "page_load_rds", "/rds/"),
                row("2025-01-03T00:00:00", "1.2.3.4", "page_load_home", "/"),
            ],
        ));
        let pipeline = LogPipeline::new(backend.clone(), &config());

        let records = pipeline.run(now()).await.unwrap();

        assert_eq!(backend.fetches(), 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("ip"), Some("1.2.3.4"));
        assert_eq!(records[0].get("event"), Some("page_load_home"));
        assert_eq!(records[1].get("ip"), Some("5.6.7.8"));
        assert_eq!(records[1].get("page"), Some("/rds/"));
    }

    #[tokio::test]
    async fn test_end_to_end_against_memory_backend() {
        let backend = Arc::new(MemoryBackend::default());
        let lines = [
            (3, r#"{"ip": "1.2.3.4", "event": "page_load_home", "page": "/"}"#),
            (2, r#"{"ip": "unknown", "event": "x", "page": "/y"}"#),
            (1, r#"{"ip": "5.6.7.8", "event": "page_load_rds", "page": "/rds/"}"#),
        ];
        for (hour, line) in lines {
            let at = Utc.with_ymd_and_hms(2025, 1, 3, hour, 0, 0).unwrap();
            backend.record(at, format!("INFO access_log: {line}"));
        }
        let pipeline = LogPipeline::new(backend, &config());

        let records = pipeline.run(now()).await.unwrap();

        let ips: Vec<_> = records.iter().map(|r| r.get("ip").unwrap()).collect();
        assert_eq!(ips, vec!["1.2.3.4", "5.6.7.8"]);
        assert_eq!(records[0].timestamp(), Some("2025-01-03 03:00:00.000"));
        assert_eq!(records[1].get("event"), Some("page_load_rds"));
    }

    #[tokio::test]
    async fn test_failed_query_returns_its_rows() {
        let backend = Arc::new(ScriptedBackend::new(vec![QueryStatus::Failed], vec![]));
        let pipeline = LogPipeline::new(backend, &config());
        assert!(pipeline.run(now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::failing_submit("AccessDenied"));
        let pipeline = LogPipeline::new(backend.clone(), &config());

        let result = pipeline.run(now()).await;

        assert!(matches!(
            result,
            Err(LogQueryError::SubmitFailed(ref m)) if m == "AccessDenied"
        ));
        assert_eq!(backend.fetches(), 0);
    }
}
