//! Level and source statistics.

use crate::{app::AppState, error::ServiceError, models::stats::log_stats::LogStats};
use axum::{Json, extract::State};

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<LogStats>, ServiceError> {
  Ok(Json(state.query.stats().await?))
}
