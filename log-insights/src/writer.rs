//! Access log write path.
//!
//! Every call emits exactly one log line holding a JSON object with
//! `", "` and `": "` separators. The `parse` rules of
//! [`InsightsQuery::access_log`](crate::query::InsightsQuery::access_log)
//! match on that exact layout, so field names, order and spacing here must not
//! drift from the query.

use crate::errors::Result;
use crate::query::UNKNOWN_IP;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::Formatter;
use std::io;

/// Target of the tracing event that carries the entry.
pub const ACCESS_LOG_TARGET: &str = "access_log";

const UNKNOWN_EVENT: &str = "unknown_event";
const UNKNOWN_PAGE: &str = "unknown_page";
const UNKNOWN_USER_AGENT: &str = "unknown";

/// Request metadata the gateway attaches to every write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub ip: String,
    pub event: Value,
    pub page: Value,
    pub user_agent: String,
    pub referer: String,
}

impl LogEntry {
    /// Builds the entry from a raw request body.
    ///
    /// A body that is empty, not JSON, or not a JSON object counts as `{}`.
    /// `event` and `page` keep whatever JSON value the caller sent.
    pub fn from_body(body: &[u8], client: ClientInfo, now: DateTime<Utc>) -> Self {
        let mut payload = match parse_body(body) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        LogEntry {
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            ip: client.source_ip.unwrap_or_else(|| UNKNOWN_IP.to_string()),
            event: payload
                .remove("event")
                .unwrap_or_else(|| Value::from(UNKNOWN_EVENT)),
            page: payload
                .remove("page")
                .unwrap_or_else(|| Value::from(UNKNOWN_PAGE)),
            user_agent: client
                .user_agent
                .unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string()),
            referer: client.referer.unwrap_or_default(),
        }
    }

    /// Renders the entry as the single line written to the log stream.
    pub fn to_line(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
        self.serialize(&mut serializer)?;
        // The formatter only ever writes ASCII
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Writes the entry to the log stream.
    pub fn emit(&self) -> Result<String> {
        let line = self.to_line()?;
        tracing::info!(target: ACCESS_LOG_TARGET, "{line}");
        Ok(line)
    }
}

fn parse_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed JSON body; defaulting to empty object");
            None
        }
    }
}

/// Single-line JSON with a space after every `,` and `:`, and every non-ASCII
/// character escaped as `\uXXXX`.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
