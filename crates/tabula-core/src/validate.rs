//! Record validation against a schema snapshot.
//!
//! [`validate`] is a pure function of the schema and the raw record: it never
//! mutates anything and can run without holding any lock.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  record::RawRecord,
  schema::{Field, RECORD_ID_KEY, Schema},
  value::{FieldType, Value},
};

/// How a write treats missing and unknown keys.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValidationMode {
  /// Reject records with missing or unknown fields.
  #[default]
  Strict,
  /// Fill missing fields with their defaults and drop unknown keys.
  Lenient,
}

/// Why a record failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Reason {
  UnknownField,
  MissingField,
  TypeMismatch { expected: FieldType },
  /// The record's `id` is not a UUID string.
  InvalidId,
}

/// One problem with one key of a raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
  /// The field name, or the raw key for [`Reason::UnknownField`].
  pub field:  String,
  #[serde(flatten)]
  pub reason: Reason,
}

impl Finding {
  fn missing(field: &Field) -> Self {
    Self { field: field.name.clone(), reason: Reason::MissingField }
  }

  fn mismatch(field: &Field) -> Self {
    Self {
      field:  field.name.clone(),
      reason: Reason::TypeMismatch { expected: field.field_type },
    }
  }

  fn unknown(key: &str) -> Self {
    Self { field: key.to_owned(), reason: Reason::UnknownField }
  }

  fn invalid_id() -> Self {
    Self { field: RECORD_ID_KEY.to_owned(), reason: Reason::InvalidId }
  }
}

/// Typed values in schema order, keyed by field id.
pub type TypedValues = Vec<(Uuid, Value)>;

/// Check `raw` against `schema`.
///
/// Keys address a field by exact name, or failing that by field id. When a
/// field is addressed both ways the named value wins and the id key counts as
/// unknown. Findings are reported in schema order, followed by unknown keys in
/// the order they were sent.
pub fn validate(
  schema: &Schema,
  raw: &RawRecord,
  mode: ValidationMode,
) -> Result<TypedValues, Vec<Finding>> {
  let fields = schema.fields();
  let mut slots: Vec<Option<&serde_json::Value>> = vec![None; fields.len()];
  let mut unknown: Vec<&str> = Vec::new();

  for (key, value) in &raw.values {
    if let Some(i) = by_name(fields, key) {
      slots[i] = Some(value);
    }
  }
  for (key, value) in &raw.values {
    if by_name(fields, key).is_some() {
      continue;
    }
    match by_id(fields, key) {
      Some(i) if slots[i].is_none() => slots[i] = Some(value),
      _ => unknown.push(key),
    }
  }

  let mut typed = Vec::with_capacity(fields.len());
  let mut findings = Vec::new();

  for (field, slot) in fields.iter().zip(slots) {
    match slot {
      Some(value) => match Value::coerce(field.field_type, value) {
        Some(v) => typed.push((field.field_id, v)),
        None => findings.push(Finding::mismatch(field)),
      },
      None if mode == ValidationMode::Lenient => {
        typed.push((field.field_id, field.default.clone()))
      }
      None => findings.push(Finding::missing(field)),
    }
  }

  if mode == ValidationMode::Strict {
    findings.extend(unknown.into_iter().map(Finding::unknown));
  }

  if findings.is_empty() { Ok(typed) } else { Err(findings) }
}

/// The id sent with `raw`, if any. Anything but a UUID string is a finding.
pub fn record_id(raw: &RawRecord) -> Result<Option<Uuid>, Finding> {
  match &raw.id {
    None => Ok(None),
    Some(serde_json::Value::String(s)) => {
      Uuid::parse_str(s).map(Some).map_err(|_| Finding::invalid_id())
    }
    Some(_) => Err(Finding::invalid_id()),
  }
}

fn by_name(fields: &[Field], key: &str) -> Option<usize> {
  fields.iter().position(|f| f.name == key)
}

fn by_id(fields: &[Field], key: &str) -> Option<usize> {
  let id = Uuid::parse_str(key).ok()?;
  fields.iter().position(|f| f.field_id == id)
}
