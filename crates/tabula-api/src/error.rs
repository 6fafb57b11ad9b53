//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tabula_core::{store::StoreError, write::BatchError};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A batch failed validation; the body is the [`BatchError`] itself.
  #[error("rejected: {0}")]
  Rejected(BatchError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error it wraps, if any.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    if let Some(core) = e.core() {
      let message = core.to_string();
      if core.is_not_found() {
        return Self::NotFound(message);
      }
      match core {
        tabula_core::Error::DuplicateFieldName(_) => return Self::Conflict(message),
        tabula_core::Error::InvalidFieldName(_)
        | tabula_core::Error::InvalidDefault { .. } => {
          return Self::BadRequest(message);
        }
        _ => {}
      }
    }
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Rejected(batch) => {
        return (StatusCode::BAD_REQUEST, Json(batch)).into_response();
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
