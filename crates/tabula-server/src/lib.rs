//! HTTP server wiring for Tabula: configuration and the top-level router.
//!
//! The binary in `main.rs` reads a [`ServerConfig`], opens the configured
//! backend and serves [`router`] over TCP.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tabula_core::{store::DatastoreStore, validate::ValidationMode};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which [`DatastoreStore`] backend to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
  Memory,
  Sqlite,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `TABULA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store:           StoreKind,
  /// Only read when `store = "sqlite"`.
  pub store_path:      PathBuf,
  pub validation_mode: ValidationMode,
}

/// Layer the optional file at `path` and the environment over the defaults.
pub fn load_config(path: PathBuf) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 5680)?
    .set_default("store", "memory")?
    .set_default("store_path", "tabula.db")?
    .set_default("validation_mode", "strict")?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("TABULA"))
    .build()?
    .try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router for `store`, with request tracing.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: DatastoreStore + 'static,
{
  tabula_api::api_router(store, config.validation_mode)
    .layer(TraceLayer::new_for_http())
}
