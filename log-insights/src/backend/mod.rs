//! The log-search backend seam.
//!
//! Queries run asynchronously on the backend: submission returns a handle, and
//! the result is fetched with that handle until the backend reports a terminal
//! status.

pub mod cloudwatch;
pub mod memory;

use crate::errors::Result;
use crate::query::QueryRequest;
use async_trait::async_trait;
use std::fmt;

pub use cloudwatch::CloudWatchBackend;
pub use memory::MemoryBackend;

/// Opaque identifier of a submitted query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryHandle(String);

impl QueryHandle {
    pub fn new(id: impl Into<String>) -> Self {
        QueryHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Complete,
    Failed,
    Cancelled,
    /// Any status the backend may report while the query is still pending,
    /// such as `Scheduled`, `Running`, `Timeout` or `Unknown`.
    Pending(String),
}

impl QueryStatus {
    /// Only `Complete`, `Failed` and `Cancelled` end the poll loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueryStatus::Pending(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            QueryStatus::Complete => "Complete",
            QueryStatus::Failed => "Failed",
            QueryStatus::Cancelled => "Cancelled",
            QueryStatus::Pending(status) => status,
        }
    }
}

impl From<&str> for QueryStatus {
    fn from(status: &str) -> Self {
        match status {
            "Complete" => QueryStatus::Complete,
            "Failed" => QueryStatus::Failed,
            "Cancelled" => QueryStatus::Cancelled,
            other => QueryStatus::Pending(other.to_string()),
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(field, value)` cell of a result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        ResultField {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result cells in the order the backend reported them
pub type Row = Vec<ResultField>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub status: QueryStatus,
    pub rows: Vec<Row>,
}

#[async_trait]
pub trait LogSearchBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Submit one query and return the handle to poll for its result.
    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryHandle>;

    /// Fetch the current status of a query, along with whatever rows are ready.
    async fn get_query_result(&self, handle: &QueryHandle) -> Result<QueryResult>;
}
