//! SQLite-backed log store.
//!
//! Batches are written inside one transaction while holding the write side of
//! an in-process gate. Queries and aggregates hold the read side, so readers
//! never see a half-written batch and two batches never interleave.

use crate::models::{
    log::{log_entry::LogEntry, log_row::LogRow, new_log_entry::NewLogEntry},
    stats::log_stats::{LogStats, NameCount},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Validated, conjunctive query filter. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Case-insensitive exact match on `level`.
    pub level: Option<String>,
    /// Exact match on `source`.
    pub source: Option<String>,
    /// Inclusive first calendar day (UTC) of `timestamp`.
    pub start_date: Option<NaiveDate>,
    /// Inclusive last calendar day (UTC) of `timestamp`.
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of `message`.
    pub search: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct LogStore {
    pool: SqlitePool,
    gate: Arc<RwLock<()>>,
}

impl LogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            gate: Arc::new(RwLock::new(())),
        }
    }

    /// Insert all entries atomically, returning their ids in batch order.
    pub async fn insert_batch(&self, entries: &[NewLogEntry]) -> Result<Vec<i64>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.gate.write().await;
        let mut tx = self.pool.begin().await?;
        match insert_rows(&mut tx, entries).await {
            Ok(ids) => {
                tx.commit().await?;
                Ok(ids)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    /// Entries matching `filter`, ordered by timestamp then id.
    pub async fn query(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, ts_us, level, source, message, created_at_us FROM logs WHERE 1 = 1",
        );
        if let Some(level) = &filter.level {
            qb.push(" AND level_folded = ").push_bind(fold(level));
        }
        if let Some(source) = &filter.source {
            qb.push(" AND source = ").push_bind(source.clone());
        }
        if let Some(start) = filter.start_date {
            qb.push(" AND ts_us >= ").push_bind(day_start_us(start));
        }
        // An end date with no following day leaves the range open.
        if let Some(next) = filter.end_date.and_then(|d| d.succ_opt()) {
            qb.push(" AND ts_us < ").push_bind(day_start_us(next));
        }
        if let Some(term) = &filter.search {
            qb.push(" AND instr(message_folded, ")
                .push_bind(fold(term))
                .push(") > 0");
        }
        qb.push(" ORDER BY ts_us ASC, id ASC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let _guard = self.gate.read().await;
        let rows: Vec<LogRow> = qb.build_query_as::<LogRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(LogEntry::from).collect())
    }

    /// Level and source distributions over the whole store.
    pub async fn aggregate(&self) -> Result<LogStats, sqlx::Error> {
        let _guard = self.gate.read().await;
        let levels: Vec<NameCount> = sqlx::query_as(
            "SELECT level AS name, COUNT(*) AS count FROM logs GROUP BY level ORDER BY count DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        let sources: Vec<NameCount> = sqlx::query_as(
            "SELECT source AS name, COUNT(*) AS count FROM logs GROUP BY source ORDER BY count DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(LogStats { levels, sources })
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let _guard = self.gate.read().await;
        sqlx::query_scalar("SELECT COUNT(*) FROM logs")
            .fetch_one(&self.pool)
            .await
    }
}

async fn insert_rows(
    tx: &mut Transaction<'_, Sqlite>,
    entries: &[NewLogEntry],
) -> Result<Vec<i64>, sqlx::Error> {
    let last: Option<i64> = sqlx::query_scalar("SELECT MAX(created_at_us) FROM logs")
        .fetch_one(&mut **tx)
        .await?;
    let now = Utc::now().timestamp_micros();
    let base = match last {
        Some(last) => now.max(last + 1),
        None => now,
    };

    let mut ids = Vec::with_capacity(entries.len());
    for (offset, entry) in (0_i64..).zip(entries) {
        let id = sqlx::query(
            "INSERT INTO logs (ts_us, level, level_folded, source, message, message_folded, created_at_us) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.timestamp.timestamp_micros())
        .bind(&entry.level)
        .bind(fold(&entry.level))
        .bind(&entry.source)
        .bind(&entry.message)
        .bind(fold(&entry.message))
        .bind(base + offset)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();
        ids.push(id);
    }
    Ok(ids)
}

/// Unicode lowercase applied to stored `level`/`message` copies and to filter values.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

fn day_start_us(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp_micros()
}
