//! Database row for a log entry. Timestamps are microseconds since the epoch.

use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct LogRow {
    pub id: i64,
    pub ts_us: i64,
    pub level: String,
    pub source: String,
    pub message: String,
    pub created_at_us: i64,
}
