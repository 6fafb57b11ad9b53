//! Field definitions and the ordered, uniquely-named field registry.
//!
//! A [`Schema`] is the ordered field list of one datastore. Order is insertion
//! order minus removals and is the canonical column order. Keeping stored rows
//! consistent with the schema (backfill on add, strip on remove) is the job of
//! whoever owns the rows; see [`crate::datastore::Table`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  value::{FieldType, Value},
};

/// Raw-record key that carries the record id. No field may use it as a name.
pub const RECORD_ID_KEY: &str = "id";

// ─── Field ───────────────────────────────────────────────────────────────────

/// Input to [`Schema::add`] and [`crate::datastore::NewDatastore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
  pub name:       String,
  #[serde(rename = "type")]
  pub field_type: FieldType,
  /// Raw default; coerced against `field_type` with the record-value rules.
  pub default:    serde_json::Value,
}

impl FieldSpec {
  pub fn new(
    name: impl Into<String>,
    field_type: FieldType,
    default: serde_json::Value,
  ) -> Self {
    Self { name: name.into(), field_type, default }
  }

  /// Check the name and default, and mint a field with a fresh id.
  /// Uniqueness is checked by the schema, not here.
  pub fn into_field(self) -> Result<Field> {
    if self.name.trim().is_empty() || self.name == RECORD_ID_KEY {
      return Err(Error::InvalidFieldName(self.name));
    }
    let default = Value::coerce(self.field_type, &self.default).ok_or_else(|| {
      Error::InvalidDefault {
        name:     self.name.clone(),
        expected: self.field_type,
      }
    })?;
    Ok(Field {
      field_id: Uuid::new_v4(),
      name: self.name,
      field_type: self.field_type,
      default,
    })
  }
}

/// A typed column definition. Name and type never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
  pub field_id:   Uuid,
  pub name:       String,
  #[serde(rename = "type")]
  pub field_type: FieldType,
  pub default:    Value,
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema(Vec<Field>);

impl Schema {
  /// Build the initial schema of a new datastore. Names are checked for
  /// duplicates up front, so either every spec is accepted or none is.
  pub fn from_specs(specs: Vec<FieldSpec>) -> Result<Self> {
    let mut schema = Self::default();
    for spec in specs {
      schema.add(spec)?;
    }
    Ok(schema)
  }

  /// Rebuild a schema from fields already persisted in order.
  pub fn from_fields(fields: Vec<Field>) -> Self { Self(fields) }

  pub fn fields(&self) -> &[Field] { &self.0 }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn field(&self, field_id: Uuid) -> Option<&Field> {
    self.0.iter().find(|f| f.field_id == field_id)
  }

  pub fn by_name(&self, name: &str) -> Option<&Field> {
    self.0.iter().find(|f| f.name == name)
  }

  /// Fail with [`Error::DuplicateFieldName`] if `name` is taken.
  pub fn check_name_free(&self, name: &str) -> Result<()> {
    match self.by_name(name) {
      Some(_) => Err(Error::DuplicateFieldName(name.to_owned())),
      None => Ok(()),
    }
  }

  /// Append a field built from `spec`. On error the schema is unchanged.
  pub fn add(&mut self, spec: FieldSpec) -> Result<Field> {
    self.check_name_free(&spec.name)?;
    let field = spec.into_field()?;
    self.0.push(field.clone());
    Ok(field)
  }

  /// Remove a field, keeping the relative order of the rest.
  pub fn remove(&mut self, field_id: Uuid) -> Option<Field> {
    let pos = self.0.iter().position(|f| f.field_id == field_id)?;
    Some(self.0.remove(pos))
  }
}
