//! Multipart log upload.

use crate::{app::AppState, error::error_response};
use axum::{
  body::Bytes,
  extract::{Multipart, State},
  http::{HeaderMap, HeaderValue, StatusCode},
  response::{IntoResponse, Response},
};
use tracing::warn;

/// Read the `file` part of the form and ingest it as one batch.
///
/// Replies `204 No Content` with `x-inserted-count` / `x-skipped-count`
/// headers on success.
pub async fn upload_log(State(state): State<AppState>, mut multipart: Multipart) -> Response {
  let mut upload: Option<(String, Bytes)> = None;
  loop {
    match multipart.next_field().await {
      Ok(Some(field)) => {
        if field.name() != Some("file") {
          continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
          Ok(bytes) => {
            upload = Some((filename, bytes));
            break;
          }
          Err(e) => {
            warn!("upload read error: {e}");
            return error_response(e.status(), e.body_text());
          }
        }
      }
      Ok(None) => break,
      Err(e) => {
        warn!("multipart error: {e}");
        return error_response(e.status(), e.body_text());
      }
    }
  }

  let Some((filename, bytes)) = upload else {
    return error_response(StatusCode::BAD_REQUEST, "No file part");
  };
  if filename.trim().is_empty() {
    return error_response(StatusCode::BAD_REQUEST, "No selected file");
  }

  match state.ingest.ingest(&filename, &bytes).await {
    Ok(report) => {
      let mut headers = HeaderMap::new();
      headers.insert("x-inserted-count", HeaderValue::from(report.inserted_count));
      headers.insert("x-skipped-count", HeaderValue::from(report.skipped_count));
      (StatusCode::NO_CONTENT, headers).into_response()
    }
    Err(e) => e.into_response(),
  }
}
