//! Path extractor for resource ids.
//!
//! An id that does not parse names no resource, so it is reported as 404
//! like any other unknown id rather than as a malformed request.

use axum::{
  extract::{FromRequestParts, Path, rejection::PathRejection},
  http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// [`Path`], with unparseable segments rejected as [`ApiError::NotFound`].
pub struct ResourcePath<T>(pub T);

impl<S, T> FromRequestParts<S> for ResourcePath<T>
where
  S: Send + Sync,
  T: DeserializeOwned + Send,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    match Path::<T>::from_request_parts(parts, state).await {
      Ok(Path(value)) => Ok(Self(value)),
      Err(PathRejection::FailedToDeserializePathParams(e)) => {
        Err(ApiError::NotFound(e.body_text()))
      }
      Err(e) => Err(ApiError::BadRequest(e.body_text())),
    }
  }
}
