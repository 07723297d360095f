use crate::errors::{Result, TodoError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TASK: &str = "no description";

/// One task as stored and returned.
///
/// Updating an id that was never created stores the item without
/// `created_at` or `ttl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Expiry as epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    pub done: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTodo {
    pub id: Option<String>,
    pub task: Option<String>,
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTodo {
    pub id: Option<String>,
    pub task: Option<String>,
    pub done: Option<bool>,
}

impl TodoItem {
    /// New, not yet done item. Without an id in the request the creation
    /// time (`%Y%m%d%H%M%S`) is used.
    pub fn create(
        request: CreateTodo,
        now: DateTime<Utc>,
        default_ttl_seconds: i64,
    ) -> Result<Self> {
        let ttl_seconds = request.ttl_seconds.unwrap_or(default_ttl_seconds);
        let expires_at = TimeDelta::try_seconds(ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(TodoError::InvalidTtl(ttl_seconds))?;

        Ok(TodoItem {
            id: request
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| now.format("%Y%m%d%H%M%S").to_string()),
            task: request.task.unwrap_or_else(|| DEFAULT_TASK.to_string()),
            created_at: Some(now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()),
            ttl: Some(expires_at.timestamp()),
            done: false,
        })
    }
}
