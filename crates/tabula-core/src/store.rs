//! The `DatastoreStore` trait: the storage contract the engine is written
//! against.
//!
//! The trait is implemented by storage backends (`tabula-store-memory`,
//! `tabula-store-sqlite`). Higher layers (`tabula-api`, `tabula-server`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  datastore::{Datastore, DatastorePatch, NewDatastore},
  record::{RawRecord, Record},
  schema::FieldSpec,
  validate::ValidationMode,
  write::WriteResult,
};

// ─── Error classification ────────────────────────────────────────────────────

/// Backend errors that may wrap a domain error from this crate.
///
/// Callers use [`StoreError::core`] to tell "not found" or "duplicate name"
/// apart from transient backend failures.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn core(&self) -> Option<&crate::Error>;
}

impl StoreError for crate::Error {
  fn core(&self) -> Option<&crate::Error> { Some(self) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a datastore backend.
///
/// Every operation that mutates one datastore's schema or rows is linearised
/// with respect to every other operation on that datastore, and readers see
/// either the state before or after a mutation, never a mix. Operations on
/// different datastores do not have to wait for each other.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DatastoreStore: Send + Sync {
  type Error: StoreError;

  // ── Datastores ────────────────────────────────────────────────────────

  /// All datastores, oldest first. Rows are not included.
  fn list_datastores(
    &self,
  ) -> impl Future<Output = Result<Vec<Datastore>, Self::Error>> + Send + '_;

  /// Retrieve a datastore by id. Returns `None` if not found.
  fn get_datastore(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Datastore>, Self::Error>> + Send + '_;

  /// Create a datastore with its initial fields and no rows.
  fn create_datastore(
    &self,
    input: NewDatastore,
  ) -> impl Future<Output = Result<Datastore, Self::Error>> + Send + '_;

  fn update_datastore(
    &self,
    id: Uuid,
    patch: DatastorePatch,
  ) -> impl Future<Output = Result<Datastore, Self::Error>> + Send + '_;

  /// Delete a datastore with all of its fields and rows. A second delete of
  /// the same id fails with not-found.
  fn delete_datastore(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Append a field and backfill its default into every existing row.
  /// Returns the updated datastore.
  fn add_field(
    &self,
    id: Uuid,
    spec: FieldSpec,
  ) -> impl Future<Output = Result<Datastore, Self::Error>> + Send + '_;

  /// Remove a field and its value from every row.
  fn delete_field(
    &self,
    id: Uuid,
    field_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  /// Validate and commit a batch, all or nothing. A rejected batch is an
  /// `Ok(WriteResult::Rejected(..))`, not an `Err`.
  fn write_records(
    &self,
    id: Uuid,
    records: Vec<RawRecord>,
    mode: ValidationMode,
  ) -> impl Future<Output = Result<WriteResult, Self::Error>> + Send + '_;

  /// All rows in insertion order.
  fn get_records(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;

  fn delete_record(
    &self,
    id: Uuid,
    record_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
