//! Handlers for `/datastores/:id/columns` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/datastores/:id/columns` | Body: `{"name":"age","type":"number","default":0}` |
//! | `DELETE` | `/datastores/:id/columns/:field_id` | Strips the value from every row |

use axum::{Json, extract::State};
use serde_json::json;
use tabula_core::{datastore::Datastore, schema::FieldSpec, store::DatastoreStore};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, path::ResourcePath};

/// `POST /datastores/:id/columns`: returns the datastore with its new field.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  ResourcePath(id): ResourcePath<Uuid>,
  Json(spec): Json<FieldSpec>,
) -> Result<Json<Datastore>, ApiError>
where
  S: DatastoreStore,
{
  let datastore = state
    .store
    .add_field(id, spec)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(datastore))
}

/// `DELETE /datastores/:id/columns/:field_id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  ResourcePath((id, field_id)): ResourcePath<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: DatastoreStore,
{
  state
    .store
    .delete_field(id, field_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true })))
}
