//! Error types for `tabula-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::value::FieldType;

#[derive(Debug, Error)]
pub enum Error {
  #[error("datastore not found: {0}")]
  DatastoreNotFound(Uuid),

  #[error("field {field_id} not found in datastore {datastore_id}")]
  FieldNotFound { datastore_id: Uuid, field_id: Uuid },

  #[error("record {record_id} not found in datastore {datastore_id}")]
  RecordNotFound { datastore_id: Uuid, record_id: Uuid },

  #[error("a field named {0:?} already exists")]
  DuplicateFieldName(String),

  #[error("invalid field name {0:?}")]
  InvalidFieldName(String),

  #[error("default for field {name:?} is not a valid {expected}")]
  InvalidDefault { name: String, expected: FieldType },
}

impl Error {
  /// True for the variants the API layer reports as "not found".
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::DatastoreNotFound(_)
        | Self::FieldNotFound { .. }
        | Self::RecordNotFound { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
