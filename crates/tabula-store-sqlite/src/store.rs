//! [`SqliteStore`]: the SQLite implementation of [`DatastoreStore`].

use std::path::Path;

use uuid::Uuid;

use tabula_core::{
  datastore::{Datastore, DatastorePatch, NewDatastore},
  record::{RawRecord, Record},
  schema::FieldSpec,
  store::DatastoreStore,
  validate::ValidationMode,
  write::WriteResult,
};

use crate::{Error, Result, schema::SCHEMA, tx};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A datastore store backed by a single SQLite file.
///
/// All statements run on the connection's own thread, one closure at a time,
/// and every mutation runs in its own transaction. That linearises operations
/// across all datastores, which is stricter than the per-datastore ordering
/// the trait asks for.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DatastoreStore impl ─────────────────────────────────────────────────────

impl DatastoreStore for SqliteStore {
  type Error = Error;

  // ── Datastores ────────────────────────────────────────────────────────────

  async fn list_datastores(&self) -> Result<Vec<Datastore>> {
    self
      .conn
      .call(|conn| Ok(tx::list_datastores(conn)))
      .await?
  }

  async fn get_datastore(&self, id: Uuid) -> Result<Option<Datastore>> {
    self
      .conn
      .call(move |conn| Ok(tx::get_datastore(conn, id)))
      .await?
  }

  async fn create_datastore(&self, input: NewDatastore) -> Result<Datastore> {
    let datastore = input.into_datastore()?;
    let row = datastore.clone();
    self
      .conn
      .call(move |conn| Ok(tx::create_datastore(conn, &row)))
      .await??;

    tracing::info!(
      datastore_id = %datastore.datastore_id,
      name = %datastore.name,
      "datastore created"
    );
    Ok(datastore)
  }

  async fn update_datastore(
    &self,
    id: Uuid,
    patch: DatastorePatch,
  ) -> Result<Datastore> {
    self
      .conn
      .call(move |conn| Ok(tx::update_datastore(conn, id, patch)))
      .await?
  }

  async fn delete_datastore(&self, id: Uuid) -> Result<()> {
    let rows = self
      .conn
      .call(move |conn| Ok(tx::delete_datastore(conn, id)))
      .await??;

    tracing::info!(datastore_id = %id, rows, "datastore deleted");
    Ok(())
  }

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn add_field(&self, id: Uuid, spec: FieldSpec) -> Result<Datastore> {
    let (datastore, field, backfilled) = self
      .conn
      .call(move |conn| Ok(tx::add_field(conn, id, spec)))
      .await??;

    tracing::info!(
      datastore_id = %id,
      field_id = %field.field_id,
      name = %field.name,
      backfilled,
      "field added"
    );
    Ok(datastore)
  }

  async fn delete_field(&self, id: Uuid, field_id: Uuid) -> Result<()> {
    let field = self
      .conn
      .call(move |conn| Ok(tx::delete_field(conn, id, field_id)))
      .await??;

    tracing::info!(datastore_id = %id, name = %field.name, "field removed");
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn write_records(
    &self,
    id: Uuid,
    records: Vec<RawRecord>,
    mode: ValidationMode,
  ) -> Result<WriteResult> {
    let result = self
      .conn
      .call(move |conn| Ok(tx::write_records(conn, id, records, mode)))
      .await??;

    match &result {
      WriteResult::Written { record_ids } => {
        tracing::debug!(datastore_id = %id, count = record_ids.len(), "records written")
      }
      WriteResult::Rejected(error) => {
        tracing::debug!(datastore_id = %id, %error, "batch rejected")
      }
    }
    Ok(result)
  }

  async fn get_records(&self, id: Uuid) -> Result<Vec<Record>> {
    self
      .conn
      .call(move |conn| Ok(tx::get_records(conn, id)))
      .await?
  }

  async fn delete_record(&self, id: Uuid, record_id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(tx::delete_record(conn, id, record_id)))
      .await?
  }
}
