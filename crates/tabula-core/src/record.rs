//! Raw (untyped) and validated (typed) records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// A candidate row as submitted by a caller.
///
/// On the wire this is a flat JSON object: the optional `id` key is the record
/// id, every other key is a field name (or a field id). The id is kept as sent
/// and checked with the rest of the record, so a malformed id fails that one
/// record rather than the whole request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:     Option<serde_json::Value>,
  #[serde(flatten)]
  pub values: serde_json::Map<String, serde_json::Value>,
}

impl RawRecord {
  pub fn new() -> Self { Self::default() }

  pub fn with_id(id: Uuid) -> Self {
    Self { id: Some(serde_json::Value::String(id.to_string())), ..Self::default() }
  }

  /// Builder-style setter, mostly for tests and embedding callers.
  pub fn set(
    mut self,
    key: impl Into<String>,
    value: impl Into<serde_json::Value>,
  ) -> Self {
    self.values.insert(key.into(), value.into());
    self
  }
}

/// A stored row: exactly one value for every field currently defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
  pub record_id: Uuid,
  /// Keyed by field id.
  pub values:    BTreeMap<Uuid, Value>,
}

impl Record {
  pub fn get(&self, field_id: Uuid) -> Option<&Value> { self.values.get(&field_id) }
}
