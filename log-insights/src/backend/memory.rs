//! In-process log search for local serving and tests.
//!
//! Lines captured from the write path are kept in a bounded buffer. Submitted
//! queries are parsed back into an [`InsightsQuery`] and evaluated right away,
//! so every query is `Complete` on its first fetch.

use super::{LogSearchBackend, QueryHandle, QueryResult, QueryStatus, ResultField, Row};
use crate::errors::{LogQueryError, Result};
use crate::metrics_defs::MEMORY_LINES;
use crate::query::{
    InsightsQuery, MESSAGE_FIELD, POINTER_FIELD, QueryRequest, SortOrder, TIMESTAMP_FIELD,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use shared::gauge;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_CAPACITY: usize = 10_000;

struct StoredLine {
    at: DateTime<Utc>,
    message: String,
    sequence: u64,
}

/// Single log group held in memory. The log group of a request is ignored.
pub struct MemoryBackend {
    lines: Mutex<VecDeque<StoredLine>>,
    finished: Mutex<HashMap<String, Vec<Row>>>,
    capacity: usize,
    next_line: AtomicU64,
    next_query: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryBackend {
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryBackend {
            lines: Mutex::new(VecDeque::new()),
            finished: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            next_line: AtomicU64::new(0),
            next_query: AtomicU64::new(0),
        }
    }

    /// Stores one raw log line, evicting the oldest once full.
    pub fn record(&self, at: DateTime<Utc>, message: impl Into<String>) {
        let sequence = self.next_line.fetch_add(1, Ordering::Relaxed);
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(StoredLine {
            at,
            message: message.into(),
            sequence,
        });
        gauge!(MEMORY_LINES).set(lines.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evaluate(&self, query: &InsightsQuery, start_ms: i64, end_ms: i64) -> Vec<Row> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());

        let mut matched: Vec<(u64, IndexMap<String, String>)> = lines
            .iter()
            .filter(|line| (start_ms..=end_ms).contains(&line.at.timestamp_millis()))
            .filter_map(|line| {
                let builtins = [
                    (
                        TIMESTAMP_FIELD,
                        line.at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                    ),
                    (MESSAGE_FIELD, line.message.clone()),
                ];

                let mut cells = IndexMap::new();
                for (name, value) in &builtins {
                    if query.fields.iter().any(|f| f.as_str() == *name) {
                        cells.insert(name.to_string(), value.clone());
                    }
                }
                for rule in &query.parses {
                    let source = builtins
                        .iter()
                        .find(|(name, _)| *name == rule.source)
                        .map(|(_, value)| value.as_str());
                    if let Some(value) = source.and_then(|text| rule.apply(text)) {
                        cells.insert(rule.alias.clone(), value.to_string());
                    }
                }

                if let Some(filter) = &query.filter
                    && !filter.matches(cells.get(&filter.field).map(String::as_str))
                {
                    return None;
                }

                cells.insert(
                    POINTER_FIELD.to_string(),
                    format!("memory-{}", line.sequence),
                );
                Some((line.sequence, cells))
            })
            .collect();

        if let Some(sort) = &query.sort {
            // Ties fall back to write order, so equal timestamps still sort
            // in the requested direction
            matched.sort_by(|(a_seq, a), (b_seq, b)| {
                let a = (a.get(&sort.field).map(String::as_str).unwrap_or_default(), a_seq);
                let b = (b.get(&sort.field).map(String::as_str).unwrap_or_default(), b_seq);
                match sort.order {
                    SortOrder::Asc => a.cmp(&b),
                    SortOrder::Desc => b.cmp(&a),
                }
            });
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }

        matched
            .into_iter()
            .map(|(_, cells)| {
                cells
                    .into_iter()
                    .map(|(field, value)| ResultField { field, value })
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl LogSearchBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn submit_query(&self, request: &QueryRequest) -> Result<QueryHandle> {
        let query: InsightsQuery = request.query_text.parse()?;
        let rows = self.evaluate(&query, request.time_window_start, request.time_window_end);

        let id = format!(
            "memory-query-{}",
            self.next_query.fetch_add(1, Ordering::Relaxed)
        );
        self.finished
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), rows);
        Ok(QueryHandle::new(id))
    }

    /// Results are handed out once; a second fetch reports an unknown handle.
    async fn get_query_result(&self, handle: &QueryHandle) -> Result<QueryResult> {
        let rows = self
            .finished
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(handle.as_str())
            .ok_or_else(|| LogQueryError::UnknownHandle(handle.to_string()))?;

        Ok(QueryResult {
            status: QueryStatus::Complete,
            rows,
        })
    }
}
