use crate::backend::Row;
use crate::query::TIMESTAMP_FIELD;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One access log entry as returned to callers.
///
/// Fields appear in the order the backend first reported them; absent fields
/// are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(IndexMap<String, String>);

impl LogRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.get(TIMESTAMP_FIELD)
    }

    /// Later writes to the same field replace the value in place.
    pub fn insert(&mut self, field: String, value: String) {
        self.0.insert(field, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for LogRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut record = LogRecord::default();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// Folds every row into one record, last write wins on repeated fields.
pub fn normalize(rows: Vec<Row>) -> Vec<LogRecord> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| (cell.field, cell.value))
                .collect()
        })
        .collect()
}

/// Orders records newest first by plain string comparison of the timestamp.
///
/// The sort is stable. Records without a timestamp compare as the empty string
/// and therefore end up last.
pub fn sort_newest_first(mut records: Vec<LogRecord>) -> Vec<LogRecord> {
    records.sort_by(|a, b| {
        let a = a.timestamp().unwrap_or_default();
        let b = b.timestamp().unwrap_or_default();
        b.cmp(a)
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ResultField;

    fn record(pairs: &[(&str, &str)]) -> LogRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_field_keeps_last_value() {
        let rows = vec![vec![
            ResultField::new("ip", "1.1.1.1"),
            ResultField::new("event", "page_load_home"),
            ResultField::new("ip", "2.2.2.2"),
        ]];
        let records = normalize(rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("ip"), Some("2.2.2.2"));
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_normalize_keeps_partial_rows() {
        let rows = vec![
            vec![ResultField::new("@timestamp", "2025-01-01 00:00:00.000")],
            vec![],
        ];
        let records = normalize(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("ip"), None);
        assert!(records[1].is_empty());
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let record = record(&[("@timestamp", "t"), ("ip", "1.2.3.4"), ("event", "e")]);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"@timestamp":"t","ip":"1.2.3.4","event":"e"}"#
        );
    }

    #[test]
    fn test_sort_newest_first() {
        let records = vec![
            record(&[("@timestamp", "2025-01-02 00:00:00.000"), ("ip", "b")]),
            record(&[("@timestamp", "2025-01-03 00:00:00.000"), ("ip", "a")]),
            record(&[("@timestamp", "2025-01-01 00:00:00.000"), ("ip", "c")]),
        ];
        let sorted = sort_newest_first(records);
        let ips: Vec<_> = sorted.iter().map(|r| r.get("ip").unwrap()).collect();
        assert_eq!(ips, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_missing_timestamp_last() {
        let records = vec![
            record(&[("ip", "none")]),
            record(&[("@timestamp", "2025-01-01 00:00:00.000"), ("ip", "old")]),
        ];
        let sorted = sort_newest_first(records);
        assert_eq!(sorted[0].get("ip"), Some("old"));
        assert_eq!(sorted[1].get("ip"), Some("none"));
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let ts = "2025-01-01 00:00:00.000";
        let records = vec![
            record(&[("@timestamp", ts), ("ip", "first")]),
            record(&[("@timestamp", "2025-01-02 00:00:00.000"), ("ip", "newest")]),
            record(&[("@timestamp", ts), ("ip", "second")]),
            record(&[("@timestamp", ts), ("ip", "third")]),
        ];
        let sorted = sort_newest_first(records);
        let ips: Vec<_> = sorted.iter().map(|r| r.get("ip").unwrap()).collect();
        assert_eq!(ips, vec!["newest", "first", "second", "third"]);
    }
}
