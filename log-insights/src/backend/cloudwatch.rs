use super::{LogSearchBackend, QueryHandle, QueryResult, QueryStatus, ResultField, Row};
use crate::errors::{LogQueryError, Result};
use crate::query::QueryRequest;
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types;

/// CloudWatch Logs Insights
pub struct CloudWatchBackend {
    client: Client,
}

impl CloudWatchBackend {
    pub fn new(client: Client) -> Self {
        CloudWatchBackend { client }
    }
}

/// Converts the millisecond window to the whole seconds `StartQuery` takes,
/// rounding outwards so no part of the window is lost.
fn window_seconds(request: &QueryRequest) -> (i64, i64) {
    let start = request.time_window_start.div_euclid(1000);
    let end = (request.time_window_end + 999).div_euclid(1000);
    (start, end)
}

fn convert_rows(results: &[Vec<types::ResultField>]) -> Vec<Row> {
    results
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|cell| {
                    let field = cell.field()?;
                    Some(ResultField::new(field, cell.value().unwrap_or_default()))
                })
                .collect()
        })
        .collect()
}

#[async_trait]
impl LogSearchBackend for CloudWatchBackend {
    fn name(&self) -> &'static str {
        "cloudwatch"
    }

    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryHandle> {
        let (start, end) = window_seconds(request);
        let output = self
            .client
            .start_query()
            .log_group_name(&request.log_group)
            .start_time(start)
            .end_time(end)
            .query_string(&request.query_text)
            .limit(i32::try_from(request.max_results).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| LogQueryError::SubmitFailed(DisplayErrorContext(&e).to_string()))?;

        output
            .query_id()
            .map(QueryHandle::new)
            .ok_or(LogQueryError::MissingQueryId)
    }

    async fn get_query_result(&self, handle: &QueryHandle) -> Result<QueryResult> {
        let output = self
            .client
            .get_query_results()
            .query_id(handle.as_str())
            .send()
            .await
            .map_err(|e| LogQueryError::FetchFailed {
                handle: handle.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let status = output
            .status()
            .map(|s| QueryStatus::from(s.as_str()))
            .unwrap_or_else(|| QueryStatus::Pending("Unknown".to_string()));

        Ok(QueryResult {
            status,
            rows: convert_rows(output.results()),
        })
    }
}
