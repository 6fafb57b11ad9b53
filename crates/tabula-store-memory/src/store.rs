//! [`MemoryStore`]: the in-memory implementation of [`DatastoreStore`].

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use tabula_core::{
  datastore::{Datastore, DatastorePatch, NewDatastore, Table},
  record::{RawRecord, Record},
  schema::FieldSpec,
  store::DatastoreStore,
  validate::ValidationMode,
  write::WriteResult,
};

use crate::{Error, Result};

/// One datastore's lock. `None` once the datastore has been deleted, so an
/// operation that looked the handle up just before the delete still fails
/// with not-found instead of touching a detached table.
type Handle = Arc<RwLock<Option<Table>>>;

#[derive(Default)]
struct Catalog {
  /// Datastore ids in creation order.
  order:  Vec<Uuid>,
  tables: HashMap<Uuid, Handle>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A datastore store held entirely in memory.
///
/// Cloning is cheap; all clones share the same catalog.
///
/// Lock order: a table lock may be held while taking the catalog lock (only
/// `delete_datastore` does this), never the reverse.
#[derive(Clone, Default)]
pub struct MemoryStore {
  catalog: Arc<RwLock<Catalog>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  async fn handle(&self, id: Uuid) -> Result<Handle> {
    self
      .catalog
      .read()
      .await
      .tables
      .get(&id)
      .cloned()
      .ok_or(Error::DatastoreNotFound(id))
  }
}

// ─── DatastoreStore impl ─────────────────────────────────────────────────────

impl DatastoreStore for MemoryStore {
  type Error = Error;

  // ── Datastores ────────────────────────────────────────────────────────────

  async fn list_datastores(&self) -> Result<Vec<Datastore>> {
    let handles: Vec<Handle> = {
      let catalog = self.catalog.read().await;
      catalog
        .order
        .iter()
        .filter_map(|id| catalog.tables.get(id).cloned())
        .collect()
    };

    let mut datastores = Vec::with_capacity(handles.len());
    for handle in handles {
      if let Some(table) = handle.read().await.as_ref() {
        datastores.push(table.datastore().clone());
      }
    }
    Ok(datastores)
  }

  async fn get_datastore(&self, id: Uuid) -> Result<Option<Datastore>> {
    let handle = match self.handle(id).await {
      Ok(h) => h,
      Err(Error::DatastoreNotFound(_)) => return Ok(None),
      Err(e) => return Err(e),
    };
    Ok(handle.read().await.as_ref().map(|t| t.datastore().clone()))
  }

  async fn create_datastore(&self, input: NewDatastore) -> Result<Datastore> {
    let datastore = input.into_datastore()?;
    let id = datastore.datastore_id;

    let mut catalog = self.catalog.write().await;
    catalog.order.push(id);
    catalog
      .tables
      .insert(id, Arc::new(RwLock::new(Some(Table::new(datastore.clone())))));

    tracing::info!(datastore_id = %id, name = %datastore.name, "datastore created");
    Ok(datastore)
  }

  async fn update_datastore(
    &self,
    id: Uuid,
    patch: DatastorePatch,
  ) -> Result<Datastore> {
    let handle = self.handle(id).await?;
    let mut slot = handle.write().await;
    let table = slot.as_mut().ok_or(Error::DatastoreNotFound(id))?;
    table.apply_patch(patch);
    Ok(table.datastore().clone())
  }

  async fn delete_datastore(&self, id: Uuid) -> Result<()> {
    let handle = self.handle(id).await?;
    let mut slot = handle.write().await;
    let table = slot.take().ok_or(Error::DatastoreNotFound(id))?;

    let mut catalog = self.catalog.write().await;
    catalog.tables.remove(&id);
    catalog.order.retain(|d| *d != id);

    tracing::info!(datastore_id = %id, rows = table.len(), "datastore deleted");
    Ok(())
  }

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn add_field(&self, id: Uuid, spec: FieldSpec) -> Result<Datastore> {
    let handle = self.handle(id).await?;
    let mut slot = handle.write().await;
    let table = slot.as_mut().ok_or(Error::DatastoreNotFound(id))?;

    let field = table.add_field(spec)?;
    tracing::info!(
      datastore_id = %id,
      field_id = %field.field_id,
      name = %field.name,
      backfilled = table.len(),
      "field added"
    );
    Ok(table.datastore().clone())
  }

  async fn delete_field(&self, id: Uuid, field_id: Uuid) -> Result<()> {
    let handle = self.handle(id).await?;
    let mut slot = handle.write().await;
    let table = slot.as_mut().ok_or(Error::DatastoreNotFound(id))?;

    let field = table.remove_field(field_id)?;
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
    let handle = self.handle(id).await?;
    let mut slot = handle.write().await;
    let table = slot.as_mut().ok_or(Error::DatastoreNotFound(id))?;

    let result = table.write(records, mode);
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
    let handle = self.handle(id).await?;
    let slot = handle.read().await;
    let table = slot.as_ref().ok_or(Error::DatastoreNotFound(id))?;
    Ok(table.records())
  }

  async fn delete_record(&self, id: Uuid, record_id: Uuid) -> Result<()> {
    let handle = self.handle(id).await?;
    let mut slot = handle.write().await;
    let table = slot.as_mut().ok_or(Error::DatastoreNotFound(id))?;
    table.delete_record(record_id)?;
    Ok(())
  }
}
