//! Filtered log listing.

use crate::{
  app::AppState,
  error::ServiceError,
  models::log::log_entry::LogEntry,
  query::LogQuery,
};
use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};

pub async fn list_logs(
  State(state): State<AppState>,
  params: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<Vec<LogEntry>>, ServiceError> {
  let Query(params) =
    params.map_err(|rejection| ServiceError::invalid_filter("query", rejection.body_text()))?;
  let logs = state.query.list(&params).await?;
  Ok(Json(logs))
}
