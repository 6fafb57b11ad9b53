//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings. Cell values are stored as their plain JSON form and
//! decoded against the owning field's type.

use std::{collections::BTreeMap, str::FromStr as _};

use chrono::{DateTime, Utc};
use tabula_core::{
  datastore::Datastore,
  schema::{Field, Schema},
  value::{FieldType, Value},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── FieldType ───────────────────────────────────────────────────────────────

pub fn decode_field_type(s: &str) -> Result<FieldType> {
  FieldType::from_str(s).map_err(|_| Error::UnknownFieldType(s.to_owned()))
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// JSON path addressing one field inside `values_json`.
pub fn value_path(field_id: Uuid) -> String { format!("$.\"{field_id}\"") }

pub fn encode_value(value: &Value) -> String { value.to_json().to_string() }

pub fn encode_values(values: &BTreeMap<Uuid, Value>) -> String {
  let object: serde_json::Map<_, _> = values
    .iter()
    .map(|(id, v)| (encode_uuid(*id), v.to_json()))
    .collect();
  serde_json::Value::Object(object).to_string()
}

/// Decode a row, insisting that it holds exactly the schema's fields.
pub fn decode_values(
  schema: &Schema,
  record_id: Uuid,
  s: &str,
) -> Result<BTreeMap<Uuid, Value>> {
  let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(s)?;
  if object.len() != schema.len() {
    return Err(Error::Corrupt(format!(
      "record {record_id} has {} values for {} fields",
      object.len(),
      schema.len()
    )));
  }

  schema
    .fields()
    .iter()
    .map(|field| -> Result<(Uuid, Value)> {
      let value = object
        .get(&encode_uuid(field.field_id))
        .and_then(|raw| Value::coerce(field.field_type, raw))
        .ok_or_else(|| {
          Error::Corrupt(format!("record {record_id} field {:?}", field.name))
        })?;
      Ok((field.field_id, value))
    })
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `datastores` row.
pub struct RawDatastore {
  pub datastore_id: String,
  pub name:         String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawDatastore {
  pub fn into_datastore(self, fields: Schema) -> Result<Datastore> {
    Ok(Datastore {
      datastore_id: decode_uuid(&self.datastore_id)?,
      name: self.name,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      fields,
    })
  }
}

/// Raw strings read directly from a `fields` row.
pub struct RawField {
  pub field_id:     String,
  pub name:         String,
  pub field_type:   String,
  pub default_json: String,
}

impl RawField {
  pub fn into_field(self) -> Result<Field> {
    let field_type = decode_field_type(&self.field_type)?;
    let raw_default: serde_json::Value = serde_json::from_str(&self.default_json)?;
    let default = Value::coerce(field_type, &raw_default).ok_or_else(|| {
      Error::Corrupt(format!("default of field {:?}", self.name))
    })?;
    Ok(Field {
      field_id: decode_uuid(&self.field_id)?,
      name: self.name,
      field_type,
      default,
    })
  }
}
