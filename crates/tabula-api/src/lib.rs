//! JSON REST API for Tabula.
//!
//! Exposes an axum [`Router`] backed by any
//! [`tabula_core::store::DatastoreStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tabula_api::api_router(store.clone(), ValidationMode::Strict))
//! ```

pub mod datastores;
pub mod error;
pub mod fields;
pub mod path;
pub mod records;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use tabula_core::{store::DatastoreStore, validate::ValidationMode};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store: Arc<S>,
  /// Used for writes that do not pass `?mode=`.
  pub mode:  ValidationMode,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), mode: self.mode } }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, mode: ValidationMode) -> Router<()>
where
  S: DatastoreStore + 'static,
{
  Router::new()
    // Datastores
    .route(
      "/datastores",
      get(datastores::list::<S>).post(datastores::create::<S>),
    )
    .route(
      "/datastores/{id}",
      get(datastores::get_one::<S>)
        .patch(datastores::update::<S>)
        .delete(datastores::delete_one::<S>),
    )
    // Fields
    .route("/datastores/{id}/columns", post(fields::create::<S>))
    .route(
      "/datastores/{id}/columns/{field_id}",
      delete(fields::delete_one::<S>),
    )
    // Records
    .route(
      "/datastores/{id}/records",
      get(records::list::<S>).post(records::write::<S>),
    )
    .route(
      "/datastores/{id}/records/{record_id}",
      delete(records::delete_one::<S>),
    )
    .with_state(ApiState { store, mode })
}

#[cfg(test)]
mod tests;
