//! HTTP router and handlers.

use crate::app::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

pub mod logs;
pub mod stats;
pub mod upload;

/// Assemble the HTTP router. Routes are served at the root and under `/api`.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/upload", post(upload::upload_log))
        .route("/logs", get(logs::list_logs))
        .route("/stats", get(stats::get_stats));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
