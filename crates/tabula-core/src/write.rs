//! Bulk write planning: validate a whole batch, then commit all or nothing.
//!
//! [`prepare_batch`] is the validation half. It runs against one schema
//! snapshot and either yields every record ready to commit or a
//! [`BatchError`] naming each failing record. Backends commit the prepared
//! records under the same lock (or transaction) the snapshot was read under.

use serde::{
  Serialize, Serializer,
  ser::SerializeStruct as _,
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  record::{RawRecord, Record},
  schema::Schema,
  validate::{Finding, ValidationMode, record_id, validate},
};

/// One rejected record within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
  /// Position in the submitted batch, zero-based.
  pub index:    usize,
  /// The id as sent, which may be the reason the record failed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:       Option<serde_json::Value>,
  pub findings: Vec<Finding>,
}

/// The payload of a rejected batch, reported to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{} of {} records failed validation", .records.len(), .total)]
pub struct BatchError {
  pub total:   usize,
  pub records: Vec<RecordFailure>,
}

/// Outcome of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteResult {
  /// Every record was committed, in batch order.
  Written { record_ids: Vec<Uuid> },
  /// Nothing was committed.
  Rejected(BatchError),
}

impl WriteResult {
  pub fn is_ok(&self) -> bool { matches!(self, Self::Written { .. }) }

  pub fn error(&self) -> Option<&BatchError> {
    match self {
      Self::Written { .. } => None,
      Self::Rejected(e) => Some(e),
    }
  }
}

/// `{"ok": true}` or `{"ok": false, "error": {...}}`.
impl Serialize for WriteResult {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Written { .. } => {
        let mut s = serializer.serialize_struct("WriteResult", 1)?;
        s.serialize_field("ok", &true)?;
        s.end()
      }
      Self::Rejected(error) => {
        let mut s = serializer.serialize_struct("WriteResult", 2)?;
        s.serialize_field("ok", &false)?;
        s.serialize_field("error", error)?;
        s.end()
      }
    }
  }
}

/// Validate every record of `batch` against `schema`.
///
/// All records are checked even after the first failure so the caller gets
/// the complete list. Records without an id are given a fresh one.
pub fn prepare_batch(
  schema: &Schema,
  batch: Vec<RawRecord>,
  mode: ValidationMode,
) -> Result<Vec<Record>, BatchError> {
  let total = batch.len();
  let mut accepted = Vec::with_capacity(total);
  let mut failures = Vec::new();

  for (index, raw) in batch.into_iter().enumerate() {
    match (record_id(&raw), validate(schema, &raw, mode)) {
      (Ok(id), Ok(typed)) => {
        if failures.is_empty() {
          accepted.push(Record {
            record_id: id.unwrap_or_else(Uuid::new_v4),
            values:    typed.into_iter().collect(),
          });
        }
      }
      (id, checked) => {
        let findings = id.err().into_iter().chain(checked.err().into_iter().flatten());
        failures.push(RecordFailure { index, id: raw.id, findings: findings.collect() });
      }
    }
  }

  if failures.is_empty() {
    Ok(accepted)
  } else {
    Err(BatchError { total, records: failures })
  }
}
