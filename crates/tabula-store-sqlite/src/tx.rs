//! Synchronous bodies of each store operation.
//!
//! Each function runs inside a single `tokio_rusqlite` call, so nothing else
//! touches the connection while it runs. Writers additionally open a
//! transaction; returning early with an error drops it, which rolls back.

use rusqlite::{Connection, OptionalExtension as _};
use tabula_core::{
  datastore::{Datastore, DatastorePatch},
  record::{RawRecord, Record},
  schema::{Field, FieldSpec, Schema},
  validate::ValidationMode,
  write::{WriteResult, prepare_batch},
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawDatastore, RawField, decode_uuid, decode_values, encode_dt, encode_uuid,
    encode_value, encode_values, value_path,
  },
};

// ─── Reads ───────────────────────────────────────────────────────────────────

fn load_schema(conn: &Connection, datastore_id: &str) -> Result<Schema> {
  let mut stmt = conn.prepare(
    "SELECT field_id, name, field_type, default_json
     FROM fields WHERE datastore_id = ?1 ORDER BY rowid",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![datastore_id], |row| {
      Ok(RawField {
        field_id:     row.get(0)?,
        name:         row.get(1)?,
        field_type:   row.get(2)?,
        default_json: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let fields = raws
    .into_iter()
    .map(RawField::into_field)
    .collect::<Result<Vec<_>>>()?;
  Ok(Schema::from_fields(fields))
}

pub fn get_datastore(conn: &Connection, id: Uuid) -> Result<Option<Datastore>> {
  let id_str = encode_uuid(id);
  let raw = conn
    .query_row(
      "SELECT datastore_id, name, created_at, updated_at
       FROM datastores WHERE datastore_id = ?1",
      rusqlite::params![id_str],
      |row| {
        Ok(RawDatastore {
          datastore_id: row.get(0)?,
          name:         row.get(1)?,
          created_at:   row.get(2)?,
          updated_at:   row.get(3)?,
        })
      },
    )
    .optional()?;

  match raw {
    Some(raw) => {
      let schema = load_schema(conn, &id_str)?;
      Ok(Some(raw.into_datastore(schema)?))
    }
    None => Ok(None),
  }
}

fn require_datastore(conn: &Connection, id: Uuid) -> Result<Datastore> {
  get_datastore(conn, id)?
    .ok_or_else(|| tabula_core::Error::DatastoreNotFound(id).into())
}

pub fn list_datastores(conn: &Connection) -> Result<Vec<Datastore>> {
  let mut stmt = conn.prepare(
    "SELECT datastore_id, name, created_at, updated_at
     FROM datastores ORDER BY rowid",
  )?;
  let raws = stmt
    .query_map([], |row| {
      Ok(RawDatastore {
        datastore_id: row.get(0)?,
        name:         row.get(1)?,
        created_at:   row.get(2)?,
        updated_at:   row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      let schema = load_schema(conn, &raw.datastore_id)?;
      raw.into_datastore(schema)
    })
    .collect()
}

pub fn get_records(conn: &Connection, id: Uuid) -> Result<Vec<Record>> {
  let datastore = require_datastore(conn, id)?;
  let mut stmt = conn.prepare(
    "SELECT record_id, values_json FROM records
     WHERE datastore_id = ?1 ORDER BY seq",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![encode_uuid(id)], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|(record_id, values_json)| {
      let record_id = decode_uuid(&record_id)?;
      let values = decode_values(&datastore.fields, record_id, &values_json)?;
      Ok(Record { record_id, values })
    })
    .collect()
}

// ─── Datastores ──────────────────────────────────────────────────────────────

fn insert_field(conn: &Connection, datastore_id: &str, field: &Field) -> Result<()> {
  conn.execute(
    "INSERT INTO fields (field_id, datastore_id, name, field_type, default_json)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(field.field_id),
      datastore_id,
      field.name,
      field.field_type.as_ref(),
      encode_value(&field.default),
    ],
  )?;
  Ok(())
}

fn touch(conn: &Connection, datastore: &mut Datastore) -> Result<()> {
  datastore.updated_at = chrono::Utc::now();
  conn.execute(
    "UPDATE datastores SET name = ?1, updated_at = ?2 WHERE datastore_id = ?3",
    rusqlite::params![
      datastore.name,
      encode_dt(datastore.updated_at),
      encode_uuid(datastore.datastore_id),
    ],
  )?;
  Ok(())
}

pub fn create_datastore(conn: &mut Connection, datastore: &Datastore) -> Result<()> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(datastore.datastore_id);
  tx.execute(
    "INSERT INTO datastores (datastore_id, name, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      id_str,
      datastore.name,
      encode_dt(datastore.created_at),
      encode_dt(datastore.updated_at),
    ],
  )?;
  for field in datastore.fields.fields() {
    insert_field(&tx, &id_str, field)?;
  }
  tx.commit()?;
  Ok(())
}

pub fn update_datastore(
  conn: &mut Connection,
  id: Uuid,
  patch: DatastorePatch,
) -> Result<Datastore> {
  let tx = conn.transaction()?;
  let mut datastore = require_datastore(&tx, id)?;
  if let Some(name) = patch.name {
    datastore.name = name;
  }
  touch(&tx, &mut datastore)?;
  tx.commit()?;
  Ok(datastore)
}

/// Returns the number of rows discarded with the datastore.
pub fn delete_datastore(conn: &mut Connection, id: Uuid) -> Result<usize> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(id);
  let rows = tx.execute(
    "DELETE FROM records WHERE datastore_id = ?1",
    rusqlite::params![id_str],
  )?;
  tx.execute("DELETE FROM fields WHERE datastore_id = ?1", rusqlite::params![id_str])?;
  let deleted = tx.execute(
    "DELETE FROM datastores WHERE datastore_id = ?1",
    rusqlite::params![id_str],
  )?;
  if deleted == 0 {
    return Err(tabula_core::Error::DatastoreNotFound(id).into());
  }
  tx.commit()?;
  Ok(rows)
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// Returns the updated datastore, the new field and the number of rows
/// backfilled.
pub fn add_field(
  conn: &mut Connection,
  id: Uuid,
  spec: FieldSpec,
) -> Result<(Datastore, Field, usize)> {
  let tx = conn.transaction()?;
  let mut datastore = require_datastore(&tx, id)?;
  let field = datastore.fields.add(spec)?;
  let id_str = encode_uuid(id);

  insert_field(&tx, &id_str, &field)?;
  let backfilled = tx.execute(
    "UPDATE records SET values_json = json_set(values_json, ?1, json(?2))
     WHERE datastore_id = ?3",
    rusqlite::params![
      value_path(field.field_id),
      encode_value(&field.default),
      id_str
    ],
  )?;
  touch(&tx, &mut datastore)?;
  tx.commit()?;
  Ok((datastore, field, backfilled))
}

pub fn delete_field(conn: &mut Connection, id: Uuid, field_id: Uuid) -> Result<Field> {
  let tx = conn.transaction()?;
  let mut datastore = require_datastore(&tx, id)?;
  let field = datastore
    .fields
    .remove(field_id)
    .ok_or(tabula_core::Error::FieldNotFound { datastore_id: id, field_id })?;

  tx.execute(
    "DELETE FROM fields WHERE field_id = ?1",
    rusqlite::params![encode_uuid(field_id)],
  )?;
  tx.execute(
    "UPDATE records SET values_json = json_remove(values_json, ?1)
     WHERE datastore_id = ?2",
    rusqlite::params![value_path(field_id), encode_uuid(id)],
  )?;
  touch(&tx, &mut datastore)?;
  tx.commit()?;
  Ok(field)
}

// ─── Records ─────────────────────────────────────────────────────────────────

pub fn write_records(
  conn: &mut Connection,
  id: Uuid,
  batch: Vec<RawRecord>,
  mode: ValidationMode,
) -> Result<WriteResult> {
  let tx = conn.transaction()?;
  let datastore = require_datastore(&tx, id)?;
  let records = match prepare_batch(&datastore.fields, batch, mode) {
    Ok(records) => records,
    Err(error) => return Ok(WriteResult::Rejected(error)),
  };

  let id_str = encode_uuid(id);
  {
    let mut stmt = tx.prepare(
      "INSERT INTO records (datastore_id, record_id, values_json)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (datastore_id, record_id)
       DO UPDATE SET values_json = excluded.values_json",
    )?;
    for record in &records {
      stmt.execute(rusqlite::params![
        id_str,
        encode_uuid(record.record_id),
        encode_values(&record.values),
      ])?;
    }
  }
  tx.commit()?;

  Ok(WriteResult::Written {
    record_ids: records.into_iter().map(|r| r.record_id).collect(),
  })
}

pub fn delete_record(conn: &mut Connection, id: Uuid, record_id: Uuid) -> Result<()> {
  let tx = conn.transaction()?;
  require_datastore(&tx, id)?;
  let deleted = tx.execute(
    "DELETE FROM records WHERE datastore_id = ?1 AND record_id = ?2",
    rusqlite::params![encode_uuid(id), encode_uuid(record_id)],
  )?;
  if deleted == 0 {
    return Err(
      tabula_core::Error::RecordNotFound { datastore_id: id, record_id }.into(),
    );
  }
  tx.commit()?;
  Ok(())
}
