//! Error types shared by the ingestion and query layers.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures surfaced by the ingestion and query services.
///
/// Per-line parse failures are not errors; the parser counts them instead.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// Uploaded file name does not carry an accepted extension.
  #[error("unsupported file '{filename}': expected extension {expected}")]
  InvalidFileKind { filename: String, expected: String },

  /// Upload content could not be decoded as text at all.
  #[error("file content is not valid UTF-8 text: {0}")]
  Decode(#[from] std::str::Utf8Error),

  /// Malformed query parameter.
  #[error("invalid filter '{field}': {reason}")]
  InvalidFilter { field: &'static str, reason: String },

  /// Underlying persistence failure.
  #[error("log store unavailable: {0}")]
  StoreUnavailable(#[from] sqlx::Error),
}

impl ServiceError {
  pub fn invalid_filter(field: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidFilter {
      field,
      reason: reason.into(),
    }
  }

  /// HTTP status this error maps to at the boundary.
  pub fn status(&self) -> StatusCode {
    match self {
      Self::InvalidFileKind { .. } | Self::Decode(_) | Self::InvalidFilter { .. } => {
        StatusCode::BAD_REQUEST
      }
      Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

impl IntoResponse for ServiceError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!("request failed: {self}");
    }
    error_response(status, self.to_string())
  }
}

/// JSON error body used for every failed request: `{"error": "..."}`.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Malformed configuration read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value '{value}' for {var}: {reason}")]
  Invalid {
    var: &'static str,
    value: String,
    reason: String,
  },
}

impl ConfigError {
  pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Invalid {
      var,
      value: value.into(),
      reason: reason.into(),
    }
  }
}
