//! Datastore metadata and the in-memory [`Table`] aggregate.
//!
//! A [`Table`] is one datastore together with its rows. Every method takes
//! `&mut self` and leaves the table either fully updated or untouched, so a
//! backend that guards a table with an exclusive lock gets all-or-nothing
//! visibility for schema changes and batch writes for free.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  record::{RawRecord, Record},
  schema::{Field, FieldSpec, Schema},
  validate::ValidationMode,
  write::{WriteResult, prepare_batch},
};

// ─── Metadata ────────────────────────────────────────────────────────────────

/// A datastore's metadata and schema. Rows are read separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datastore {
  pub datastore_id: Uuid,
  pub name:         String,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  /// Ordered: insertion order minus removals.
  pub fields:       Schema,
}

/// Input to [`crate::store::DatastoreStore::create_datastore`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewDatastore {
  pub name:   String,
  #[serde(default)]
  pub fields: Vec<FieldSpec>,
}

impl NewDatastore {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), fields: Vec::new() }
  }

  pub fn field(mut self, spec: FieldSpec) -> Self {
    self.fields.push(spec);
    self
  }

  /// Mint a datastore with a fresh id. Fails before anything is created if
  /// two specs share a name.
  pub fn into_datastore(self) -> Result<Datastore> {
    let fields = Schema::from_specs(self.fields)?;
    let now = Utc::now();
    Ok(Datastore {
      datastore_id: Uuid::new_v4(),
      name: self.name,
      created_at: now,
      updated_at: now,
      fields,
    })
  }
}

/// Input to [`crate::store::DatastoreStore::update_datastore`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatastorePatch {
  pub name: Option<String>,
}

// ─── Table ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Table {
  datastore: Datastore,
  /// Row ids in insertion order.
  order:     Vec<Uuid>,
  rows:      HashMap<Uuid, Record>,
}

impl Table {
  pub fn new(datastore: Datastore) -> Self {
    Self { datastore, order: Vec::new(), rows: HashMap::new() }
  }

  pub fn datastore(&self) -> &Datastore { &self.datastore }

  pub fn id(&self) -> Uuid { self.datastore.datastore_id }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }

  /// All rows in insertion order.
  pub fn records(&self) -> Vec<Record> {
    self.order.iter().map(|id| self.rows[id].clone()).collect()
  }

  pub fn apply_patch(&mut self, patch: DatastorePatch) {
    if let Some(name) = patch.name {
      self.datastore.name = name;
    }
    self.datastore.updated_at = Utc::now();
  }

  /// Append a field and backfill its default into every existing row.
  pub fn add_field(&mut self, spec: FieldSpec) -> Result<Field> {
    let field = self.datastore.fields.add(spec)?;
    for record in self.rows.values_mut() {
      record.values.insert(field.field_id, field.default.clone());
    }
    self.datastore.updated_at = Utc::now();
    self.check_invariants();
    Ok(field)
  }

  /// Remove a field and strip its value from every row.
  pub fn remove_field(&mut self, field_id: Uuid) -> Result<Field> {
    let field = self.datastore.fields.remove(field_id).ok_or(
      Error::FieldNotFound { datastore_id: self.id(), field_id },
    )?;
    for record in self.rows.values_mut() {
      record.values.remove(&field_id);
    }
    self.datastore.updated_at = Utc::now();
    self.check_invariants();
    Ok(field)
  }

  /// Validate `batch` against the current schema and commit it only if every
  /// record passes. Existing rows with a matching id are replaced in place;
  /// new rows are appended.
  pub fn write(&mut self, batch: Vec<RawRecord>, mode: ValidationMode) -> WriteResult {
    let records = match prepare_batch(&self.datastore.fields, batch, mode) {
      Ok(records) => records,
      Err(error) => return WriteResult::Rejected(error),
    };

    let record_ids = records.iter().map(|r| r.record_id).collect();
    for record in records {
      if !self.rows.contains_key(&record.record_id) {
        self.order.push(record.record_id);
      }
      self.rows.insert(record.record_id, record);
    }
    self.check_invariants();
    WriteResult::Written { record_ids }
  }

  pub fn delete_record(&mut self, record_id: Uuid) -> Result<Record> {
    let record = self.rows.remove(&record_id).ok_or(Error::RecordNotFound {
      datastore_id: self.id(),
      record_id,
    })?;
    self.order.retain(|id| *id != record_id);
    Ok(record)
  }

  /// Every row holds exactly the currently-defined fields.
  fn check_invariants(&self) {
    debug_assert_eq!(self.order.len(), self.rows.len());
    if cfg!(debug_assertions) {
      let fields = self.datastore.fields.fields();
      for record in self.rows.values() {
        assert_eq!(record.values.len(), fields.len(), "row {}", record.record_id);
        for field in fields {
          assert!(
            record.values.contains_key(&field.field_id),
            "row {} lacks field {}",
            record.record_id,
            field.name
          );
        }
      }
    }
  }
}
