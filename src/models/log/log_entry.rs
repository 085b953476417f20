//! Log entry exposed via the API.

use super::log_row::LogRow;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl From<LogRow> for LogEntry {
    fn from(r: LogRow) -> Self {
        LogEntry {
            id: r.id,
            timestamp: DateTime::from_timestamp_micros(r.ts_us).unwrap_or_default(),
            level: r.level,
            message: r.message,
            source: r.source,
            created_at: DateTime::from_timestamp_micros(r.created_at_us).unwrap_or_default(),
        }
    }
}
