//! Logs Insights query model.
//!
//! [`InsightsQuery`] covers the subset of the query language the access log
//! endpoint uses: `fields`, `parse` with a single quoted-value capture,
//! a presence/placeholder `filter`, `sort` and `limit`. It renders to the
//! query text sent to the backend and parses that text back, which is how the
//! in-memory backend evaluates submitted queries.

use crate::errors::LogQueryError;
use crate::extract::extract_quoted;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

/// Built-in field holding the ingestion timestamp of a line.
pub const TIMESTAMP_FIELD: &str = "@timestamp";
/// Built-in field holding the raw log line.
pub const MESSAGE_FIELD: &str = "@message";
/// Built-in field holding the backend's opaque pointer to the line.
pub const POINTER_FIELD: &str = "@ptr";

/// Fields written by the access log write path, in emission order.
pub const ACCESS_LOG_FIELDS: [&str; 5] = ["ip", "event", "page", "user_agent", "referer"];

/// Value written for `ip` when the caller's address is not known.
pub const UNKNOWN_IP: &str = "unknown";

/// Maximum number of records returned by the access log query.
pub const MAX_RESULTS: u32 = 25;

/// `parse <source> '"<key>": "*"' as <alias>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRule {
    pub source: String,
    pub key: String,
    pub alias: String,
}

impl ParseRule {
    pub fn quoted(source: &str, key: &str) -> Self {
        ParseRule {
            source: source.to_string(),
            key: key.to_string(),
            alias: key.to_string(),
        }
    }

    /// Applies the capture to `text`, the value of the rule's source field.
    pub fn apply<'a>(&self, text: &'a str) -> Option<&'a str> {
        extract_quoted(text, &self.key)
    }
}

/// `filter ispresent(<field>) and <field> != "<placeholder>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceFilter {
    pub field: String,
    pub placeholder: String,
}

impl PresenceFilter {
    pub fn matches(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| v != self.placeholder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightsQuery {
    pub fields: Vec<String>,
    pub parses: Vec<ParseRule>,
    pub filter: Option<PresenceFilter>,
    pub sort: Option<SortClause>,
    pub limit: Option<u32>,
}

impl InsightsQuery {
    /// The query behind `GET` on the log endpoint.
    ///
    /// Must stay in lockstep with the entry layout emitted by the write path.
    pub fn access_log() -> Self {
        InsightsQuery {
            fields: vec![TIMESTAMP_FIELD.to_string(), MESSAGE_FIELD.to_string()],
            parses: ACCESS_LOG_FIELDS
                .iter()
                .map(|key| ParseRule::quoted(MESSAGE_FIELD, key))
                .collect(),
            filter: Some(PresenceFilter {
                field: "ip".to_string(),
                placeholder: UNKNOWN_IP.to_string(),
            }),
            sort: Some(SortClause {
                field: TIMESTAMP_FIELD.to_string(),
                order: SortOrder::Desc,
            }),
            limit: Some(MAX_RESULTS),
        }
    }
}

impl fmt::Display for InsightsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses = Vec::new();

        if !self.fields.is_empty() {
            clauses.push(format!("fields {}", self.fields.join(", ")));
        }
        for rule in &self.parses {
            clauses.push(format!(
                "parse {} '\"{}\": \"*\"' as {}",
                rule.source, rule.key, rule.alias
            ));
        }
        if let Some(filter) = &self.filter {
            clauses.push(format!(
                "filter ispresent({field}) and {field} != \"{}\"",
                filter.placeholder,
                field = filter.field
            ));
        }
        if let Some(sort) = &self.sort {
            let order = match sort.order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            clauses.push(format!("sort {} {order}", sort.field));
        }
        if let Some(limit) = self.limit {
            clauses.push(format!("limit {limit}"));
        }

        write!(f, "{}", clauses.join("\n| "))
    }
}

fn invalid(clause: &str) -> LogQueryError {
    LogQueryError::InvalidQuery(clause.to_string())
}

impl FromStr for InsightsQuery {
    type Err = LogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut query = InsightsQuery::default();

        for clause in s.split('|').map(str::trim).filter(|c| !c.is_empty()) {
            let (command, rest) = clause
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid(clause))?;
            let rest = rest.trim();

            match command {
                "fields" => query
                    .fields
                    .extend(rest.split(',').map(|f| f.trim().to_string())),
                "parse" => query.parses.push(rest.parse()?),
                "filter" => query.filter = Some(rest.parse()?),
                "sort" => query.sort = Some(rest.parse()?),
                "limit" => query.limit = Some(rest.parse().map_err(|_| invalid(clause))?),
                _ => return Err(invalid(clause)),
            }
        }

        Ok(query)
    }
}

impl FromStr for ParseRule {
    type Err = LogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = || -> Option<ParseRule> {
            let (source, rest) = s.split_once(' ')?;
            let (pattern, tail) = rest.trim_start().strip_prefix('\'')?.split_once('\'')?;
            let alias = tail.trim_start().strip_prefix("as ")?.trim();
            let key = pattern.strip_prefix('"')?.strip_suffix("\": \"*\"")?;
            Some(ParseRule {
                source: source.to_string(),
                key: key.to_string(),
                alias: alias.to_string(),
            })
        };
        parse().ok_or_else(|| invalid(s))
    }
}

impl FromStr for PresenceFilter {
    type Err = LogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = || -> Option<PresenceFilter> {
            let (field, rest) = s.strip_prefix("ispresent(")?.split_once(')')?;
            let rest = rest.trim_start().strip_prefix("and ")?.trim_start();
            let rest = rest.strip_prefix(field)?.trim_start().strip_prefix("!=")?;
            let placeholder = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
            Some(PresenceFilter {
                field: field.to_string(),
                placeholder: placeholder.to_string(),
            })
        };
        parse().ok_or_else(|| invalid(s))
    }
}

impl FromStr for SortClause {
    type Err = LogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = s.split_once(' ').unwrap_or((s, "asc"));
        let order = match order.trim() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => return Err(invalid(s)),
        };
        Ok(SortClause {
            field: field.to_string(),
            order,
        })
    }
}

/// A single query submission against one log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub log_group: String,
    /// Epoch milliseconds, inclusive
    pub time_window_start: i64,
    /// Epoch milliseconds, inclusive
    pub time_window_end: i64,
    pub query_text: String,
    pub max_results: u32,
}

impl QueryRequest {
    /// Covers the `lookback` period ending at `now`.
    pub fn trailing(
        log_group: &str,
        now: DateTime<Utc>,
        lookback: TimeDelta,
        query: &InsightsQuery,
    ) -> Self {
        QueryRequest {
            log_group: log_group.to_string(),
            time_window_start: (now - lookback).timestamp_millis(),
            time_window_end: now.timestamp_millis(),
            query_text: query.to_string(),
            max_results: query.limit.unwrap_or(MAX_RESULTS),
        }
    }
}
