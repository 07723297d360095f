//! Quoted key/value extraction over raw log lines.
//!
//! Log lines are treated as near-JSON text: the value for `key` is whatever
//! sits between the quotes following the literal `"key": "`. Anything before
//! the payload (timestamps, levels, request ids added by the log framework) is
//! skipped over. This is deliberately not a JSON parser: a strict parse would
//! reject exactly those prefixed lines.

/// Returns the value following the first `"key": "` in `line`, up to the next `"`.
///
/// Returns `None` when the key does not appear or the value is never closed.
pub fn extract_quoted<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{key}\": \"");
    let start = line.find(&needle)? + needle.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}
