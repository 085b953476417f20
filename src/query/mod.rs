//! Filter validation over the log store.

use crate::{
    error::ServiceError,
    models::{log::log_entry::LogEntry, stats::log_stats::LogStats},
    store::{LogFilter, LogStore},
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Largest `limit` a caller may request.
pub const MAX_LIMIT: u32 = 10_000;

/// Raw query-string parameters of `GET /logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub level: Option<String>,
    pub source: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(alias = "search_term")]
    pub search: Option<String>,
    pub limit: Option<String>,
}

impl LogQuery {
    /// Validate raw parameters into a store filter. Blank values are treated
    /// as absent.
    pub fn validate(&self) -> Result<LogFilter, ServiceError> {
        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = parse_date("end_date", &self.end_date)?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(ServiceError::invalid_filter(
                    "start_date",
                    format!("{start} is after end_date {end}"),
                ));
            }
        }
        let limit = match non_blank(&self.limit) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => Some(n),
                _ => {
                    return Err(ServiceError::invalid_filter(
                        "limit",
                        format!("expected an integer between 1 and {MAX_LIMIT}, got '{raw}'"),
                    ));
                }
            },
        };
        Ok(LogFilter {
            level: non_blank(&self.level).map(str::to_string),
            source: non_blank(&self.source).map(str::to_string),
            start_date,
            end_date,
            search: non_blank(&self.search).map(str::to_string),
            limit,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(field: &'static str, value: &Option<String>) -> Result<Option<NaiveDate>, ServiceError> {
    non_blank(value)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ServiceError::invalid_filter(field, format!("expected YYYY-MM-DD, got '{raw}'"))
            })
        })
        .transpose()
}

#[derive(Clone)]
pub struct QueryService {
    store: LogStore,
}

impl QueryService {
    pub fn new(store: LogStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, params: &LogQuery) -> Result<Vec<LogEntry>, ServiceError> {
        let filter = params.validate()?;
        Ok(self.store.query(&filter).await?)
    }

    pub async fn stats(&self) -> Result<LogStats, ServiceError> {
        Ok(self.store.aggregate().await?)
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.store.count().await?)
    }
}
