//! Field types and the closed set of typed cell values.
//!
//! Raw input arrives as arbitrary JSON. [`Value::coerce`] is the single place
//! where a raw JSON value is checked against a [`FieldType`]; everything past
//! the validator only ever handles [`Value`]s.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

// ─── FieldType ───────────────────────────────────────────────────────────────

/// The type of a column. New variants may be added without touching values
/// already stored under existing variants.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
  String,
  Number,
  Boolean,
  Date,
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// A fully-typed cell value.
///
/// Serialises as the plain JSON scalar; dates are written as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  String(String),
  Number(f64),
  Boolean(bool),
  Date(DateTime<Utc>),
}

impl Value {
  pub fn field_type(&self) -> FieldType {
    match self {
      Self::String(_) => FieldType::String,
      Self::Number(_) => FieldType::Number,
      Self::Boolean(_) => FieldType::Boolean,
      Self::Date(_) => FieldType::Date,
    }
  }

  /// Coerce a raw JSON value into a value of type `ty`, or `None` if it does
  /// not conform.
  ///
  /// - `number`: JSON numbers and numeric strings; the result must be finite.
  /// - `boolean`: `true` and `false` only.
  /// - `string`: strings, plus numbers and booleans rendered as text.
  /// - `date`: RFC 3339 timestamps or `YYYY-MM-DD` (midnight UTC). Numbers
  ///   are rejected since epoch seconds vs. millis is ambiguous.
  pub fn coerce(ty: FieldType, raw: &Json) -> Option<Self> {
    match (ty, raw) {
      (FieldType::Number, Json::Number(n)) => {
        n.as_f64().filter(|f| f.is_finite()).map(Self::Number)
      }
      (FieldType::Number, Json::String(s)) => s
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Self::Number),
      (FieldType::Boolean, Json::Bool(b)) => Some(Self::Boolean(*b)),
      (FieldType::String, Json::String(s)) => Some(Self::String(s.clone())),
      (FieldType::String, Json::Number(n)) => Some(Self::String(n.to_string())),
      (FieldType::String, Json::Bool(b)) => Some(Self::String(b.to_string())),
      (FieldType::Date, Json::String(s)) => parse_date(s).map(Self::Date),
      _ => None,
    }
  }

  /// The JSON form of this value. Always accepted by [`Value::coerce`] for
  /// the value's own type, which is what backends rely on when decoding.
  pub fn to_json(&self) -> Json {
    match self {
      Self::String(s) => Json::String(s.clone()),
      Self::Number(n) => serde_json::Number::from_f64(*n)
        .map(Json::Number)
        .unwrap_or(Json::Null),
      Self::Boolean(b) => Json::Bool(*b),
      Self::Date(d) => Json::String(d.to_rfc3339()),
    }
  }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}
