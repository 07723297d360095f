use crate::backend::{LogSearchBackend, QueryHandle, QueryResult, QueryStatus, Row};
use crate::errors::{LogQueryError, Result};
use crate::poller::PollPolicy;
use crate::query::QueryRequest;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that plays back a fixed sequence of statuses, one per fetch.
///
/// The configured rows are attached to every fetch reporting a terminal status.
/// Once the script runs out, fetches report `Complete`.
pub struct ScriptedBackend {
    statuses: Mutex<VecDeque<QueryStatus>>,
    rows: Vec<Row>,
    submitted: Mutex<Vec<QueryRequest>>,
    fetches: AtomicUsize,
    submit_error: Option<String>,
    fetch_error: Option<String>,
}

impl ScriptedBackend {
    pub fn new(statuses: Vec<QueryStatus>, rows: Vec<Row>) -> Self {
        ScriptedBackend {
            statuses: Mutex::new(statuses.into()),
            rows,
            submitted: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            submit_error: None,
            fetch_error: None,
        }
    }

    pub fn completing_with(rows: Vec<Row>) -> Self {
        Self::new(vec![QueryStatus::Complete], rows)
    }

    pub fn failing_submit(message: &str) -> Self {
        ScriptedBackend {
            submit_error: Some(message.to_string()),
            ..Self::new(vec![], vec![])
        }
    }

    pub fn failing_fetch(message: &str) -> Self {
        ScriptedBackend {
            fetch_error: Some(message.to_string()),
            ..Self::new(vec![], vec![])
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<QueryRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSearchBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryHandle> {
        if let Some(message) = &self.submit_error {
            return Err(LogQueryError::SubmitFailed(message.clone()));
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(QueryHandle::new("scripted-query"))
    }

    async fn get_query_result(&self, handle: &QueryHandle) -> Result<QueryResult> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fetch_error {
            return Err(LogQueryError::FetchFailed {
                handle: handle.to_string(),
                message: message.clone(),
            });
        }

        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(QueryStatus::Complete);
        let rows = match status.is_terminal() {
            true => self.rows.clone(),
            false => Vec::new(),
        };
        Ok(QueryResult { status, rows })
    }
}

/// Poll policy that does not slow tests down.
pub fn fast_policy(max_attempts: Option<u32>) -> PollPolicy {
    PollPolicy {
        interval_ms: 1,
        max_attempts,
    }
}
