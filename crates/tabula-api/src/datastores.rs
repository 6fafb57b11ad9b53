//! Handlers for `/datastores` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/datastores` | Oldest first |
//! | `POST`   | `/datastores` | Body: `{"name":"people","fields":[...]}` |
//! | `GET`    | `/datastores/:id` | 404 if not found |
//! | `PATCH`  | `/datastores/:id` | Body: `{"name":"humans"}` |
//! | `DELETE` | `/datastores/:id` | Drops every field and row |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde_json::json;
use tabula_core::{
  datastore::{Datastore, DatastorePatch, NewDatastore},
  store::DatastoreStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, path::ResourcePath};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /datastores`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Datastore>>, ApiError>
where
  S: DatastoreStore,
{
  let datastores = state
    .store
    .list_datastores()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(datastores))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /datastores`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewDatastore>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DatastoreStore,
{
  let datastore = state
    .store
    .create_datastore(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(datastore)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /datastores/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  ResourcePath(id): ResourcePath<Uuid>,
) -> Result<Json<Datastore>, ApiError>
where
  S: DatastoreStore,
{
  let datastore = state
    .store
    .get_datastore(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("datastore not found: {id}")))?;
  Ok(Json(datastore))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /datastores/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  ResourcePath(id): ResourcePath<Uuid>,
  Json(patch): Json<DatastorePatch>,
) -> Result<Json<Datastore>, ApiError>
where
  S: DatastoreStore,
{
  let datastore = state
    .store
    .update_datastore(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(datastore))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /datastores/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  ResourcePath(id): ResourcePath<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: DatastoreStore,
{
  state
    .store
    .delete_datastore(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true })))
}
