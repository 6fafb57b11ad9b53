//! Handlers for `/datastores/:id/records` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/datastores/:id/records` | Insertion order |
//! | `POST`   | `/datastores/:id/records` | Body: `{"records":[...]}`, optional `?mode=strict\|lenient` |
//! | `DELETE` | `/datastores/:id/records/:record_id` | |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use serde_json::json;
use tabula_core::{
  record::{RawRecord, Record},
  store::DatastoreStore,
  validate::ValidationMode,
  write::WriteResult,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, path::ResourcePath};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /datastores/:id/records`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  ResourcePath(id): ResourcePath<Uuid>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: DatastoreStore,
{
  let records = state
    .store
    .get_records(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Write ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WriteParams {
  pub mode: Option<ValidationMode>,
}

#[derive(Debug, Deserialize)]
pub struct WriteBody {
  pub records: Vec<RawRecord>,
}

/// `POST /datastores/:id/records[?mode=<mode>]`
///
/// `{"success":true,"record_ids":[...]}` when the batch commits, otherwise 400
/// with the batch error as the body.
pub async fn write<S>(
  State(state): State<ApiState<S>>,
  ResourcePath(id): ResourcePath<Uuid>,
  Query(params): Query<WriteParams>,
  Json(body): Json<WriteBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: DatastoreStore,
{
  let mode = params.mode.unwrap_or(state.mode);
  let result = state
    .store
    .write_records(id, body.records, mode)
    .await
    .map_err(ApiError::from_store)?;

  match result {
    WriteResult::Written { record_ids } => {
      Ok(Json(json!({ "success": true, "record_ids": record_ids })))
    }
    WriteResult::Rejected(error) => Err(ApiError::Rejected(error)),
  }
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /datastores/:id/records/:record_id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  ResourcePath((id, record_id)): ResourcePath<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: DatastoreStore,
{
  state
    .store
    .delete_record(id, record_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true })))
}
