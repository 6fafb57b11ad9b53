//! Tests for `MemoryStore`, including concurrent readers and writers.

use serde_json::json;
use tabula_core::{
  datastore::{DatastorePatch, NewDatastore},
  record::RawRecord,
  schema::FieldSpec,
  store::DatastoreStore,
  validate::{Reason, ValidationMode},
  value::{FieldType, Value},
  write::WriteResult,
};
use uuid::Uuid;

use crate::{Error, MemoryStore};

fn age_spec() -> FieldSpec { FieldSpec::new("age", FieldType::Number, json!(0)) }

fn active_spec() -> FieldSpec {
  FieldSpec::new("active", FieldType::Boolean, json!(true))
}

async fn people(s: &MemoryStore) -> Uuid {
  s.create_datastore(NewDatastore::new("people").field(age_spec()))
    .await
    .unwrap()
    .datastore_id
}

async fn write(s: &MemoryStore, id: Uuid, batch: Vec<RawRecord>) -> WriteResult {
  s.write_records(id, batch, ValidationMode::Strict).await.unwrap()
}

// ─── Datastores ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_datastore() {
  let s = MemoryStore::new();
  let created = s
    .create_datastore(NewDatastore::new("people").field(age_spec()))
    .await
    .unwrap();

  let fetched = s.get_datastore(created.datastore_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.fields.len(), 1);
}

#[tokio::test]
async fn get_unknown_datastore_returns_none() {
  let s = MemoryStore::new();
  assert!(s.get_datastore(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_with_duplicate_field_names_fails() {
  let s = MemoryStore::new();
  let err = s
    .create_datastore(NewDatastore::new("x").field(age_spec()).field(age_spec()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateFieldName(_)));
  assert!(s.list_datastores().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_is_in_creation_order() {
  let s = MemoryStore::new();
  for name in ["a", "b", "c"] {
    s.create_datastore(NewDatastore::new(name)).await.unwrap();
  }
  let names: Vec<_> = s
    .list_datastores()
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.name)
    .collect();
  assert_eq!(names, ["a", "b", "c"]);
}

#[tokio::test]
async fn rename_datastore() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  let updated = s
    .update_datastore(id, DatastorePatch { name: Some("humans".into()) })
    .await
    .unwrap();
  assert_eq!(updated.name, "humans");
  assert!(updated.updated_at >= updated.created_at);

  let err = s
    .update_datastore(Uuid::new_v4(), DatastorePatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DatastoreNotFound(_)));
}

#[tokio::test]
async fn delete_twice_returns_not_found() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  write(&s, id, vec![RawRecord::new().set("age", 1)]).await;

  s.delete_datastore(id).await.unwrap();
  let err = s.delete_datastore(id).await.unwrap_err();
  assert!(matches!(err, Error::DatastoreNotFound(_)));

  assert!(s.get_datastore(id).await.unwrap().is_none());
  assert!(matches!(
    s.get_records(id).await.unwrap_err(),
    Error::DatastoreNotFound(_)
  ));
  assert!(s.list_datastores().await.unwrap().is_empty());
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn schema_evolution_walkthrough() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  let age = s.get_datastore(id).await.unwrap().unwrap().fields.fields()[0].clone();

  // 1. A valid write round-trips.
  assert!(write(&s, id, vec![RawRecord::new().set("age", 30)]).await.is_ok());
  let records = s.get_records(id).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get(age.field_id), Some(&Value::Number(30.0)));

  // 2. One bad record rejects the batch and changes nothing.
  let before = serde_json::to_string(&s.get_records(id).await.unwrap()).unwrap();
  let result = write(
    &s,
    id,
    vec![RawRecord::new().set("age", 30), RawRecord::new().set("age", "x")],
  )
  .await;
  let error = result.error().unwrap();
  assert_eq!(error.records.len(), 1);
  assert_eq!(error.records[0].index, 1);
  assert_eq!(error.records[0].findings[0].field, "age");
  assert_eq!(
    error.records[0].findings[0].reason,
    Reason::TypeMismatch { expected: FieldType::Number }
  );
  let after = serde_json::to_string(&s.get_records(id).await.unwrap()).unwrap();
  assert_eq!(before, after);

  // 3. Adding a field backfills the existing row.
  let ds = s.add_field(id, active_spec()).await.unwrap();
  let active = ds.fields.by_name("active").unwrap().clone();
  let records = s.get_records(id).await.unwrap();
  assert_eq!(records[0].get(active.field_id), Some(&Value::Boolean(true)));

  // 4. The same name again is refused and the schema is unchanged.
  let err = s.add_field(id, active_spec()).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateFieldName(_)));
  let ds = s.get_datastore(id).await.unwrap().unwrap();
  assert_eq!(
    ds.fields.fields().iter().filter(|f| f.name == "active").count(),
    1
  );

  // 5. Removing the field strips it and frees the name.
  s.delete_field(id, active.field_id).await.unwrap();
  let records = s.get_records(id).await.unwrap();
  assert!(records[0].get(active.field_id).is_none());
  let ds = s
    .add_field(id, FieldSpec::new("active", FieldType::String, json!("n/a")))
    .await
    .unwrap();
  let active = ds.fields.by_name("active").unwrap();
  assert_eq!(active.field_type, FieldType::String);
  let records = s.get_records(id).await.unwrap();
  assert_eq!(
    records[0].get(active.field_id),
    Some(&Value::String("n/a".into()))
  );
}

#[tokio::test]
async fn field_operations_on_missing_targets() {
  let s = MemoryStore::new();
  let id = people(&s).await;

  let err = s.add_field(Uuid::new_v4(), active_spec()).await.unwrap_err();
  assert!(matches!(err, Error::DatastoreNotFound(_)));

  let err = s.delete_field(id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::FieldNotFound { .. }));

  let err = s
    .write_records(Uuid::new_v4(), vec![], ValidationMode::Strict)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DatastoreNotFound(_)));
}

#[tokio::test]
async fn lenient_mode_fills_defaults() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  s.add_field(id, active_spec()).await.unwrap();

  let result = s
    .write_records(
      id,
      vec![RawRecord::new().set("age", 3).set("extra", "dropped")],
      ValidationMode::Lenient,
    )
    .await
    .unwrap();
  assert!(result.is_ok());

  let records = s.get_records(id).await.unwrap();
  assert_eq!(records[0].values.len(), 2);
}

#[tokio::test]
async fn upsert_and_delete_record() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  let rid = Uuid::new_v4();

  write(&s, id, vec![RawRecord::with_id(rid).set("age", 1)]).await;
  write(&s, id, vec![RawRecord::with_id(rid).set("age", 2)]).await;
  let records = s.get_records(id).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].values.values().next(), Some(&Value::Number(2.0)));

  s.delete_record(id, rid).await.unwrap();
  assert!(s.get_records(id).await.unwrap().is_empty());
  let err = s.delete_record(id, rid).await.unwrap_err();
  assert!(matches!(err, Error::RecordNotFound { .. }));
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_a_partial_backfill() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  let batch = (0..500).map(|i| RawRecord::new().set("age", i)).collect();
  assert!(write(&s, id, batch).await.is_ok());

  let readers: Vec<_> = (0..4)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move {
        for _ in 0..50 {
          let records = s.get_records(id).await.unwrap();
          let widths: Vec<_> = records.iter().map(|r| r.values.len()).collect();
          assert!(
            widths.iter().all(|w| *w == widths[0]),
            "mixed row widths observed"
          );
          tokio::task::yield_now().await;
        }
      })
    })
    .collect();

  for i in 0..10 {
    let ds = s
      .add_field(id, FieldSpec::new(format!("f{i}"), FieldType::Number, json!(i)))
      .await
      .unwrap();
    let field_id = ds.fields.by_name(&format!("f{i}")).unwrap().field_id;
    if i % 2 == 0 {
      s.delete_field(id, field_id).await.unwrap();
    }
  }

  for reader in readers {
    reader.await.unwrap();
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_of_one_name_admit_exactly_one() {
  let s = MemoryStore::new();
  let id = people(&s).await;

  let tasks: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.add_field(id, active_spec()).await })
    })
    .collect();

  let mut ok = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => ok += 1,
      Err(e) => assert!(matches!(e, Error::DuplicateFieldName(_))),
    }
  }
  assert_eq!(ok, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batches_race_a_field_removal_without_mixing_schemas() {
  let s = MemoryStore::new();
  let id = people(&s).await;
  let ds = s.add_field(id, active_spec()).await.unwrap();
  let active = ds.fields.by_name("active").unwrap().field_id;

  let writer = {
    let s = s.clone();
    tokio::spawn(async move {
      let mut written = 0usize;
      for i in 0..100 {
        let batch = vec![RawRecord::new().set("age", i).set("active", false)];
        if write(&s, id, batch).await.is_ok() {
          written += 1;
        }
      }
      written
    })
  };
  s.delete_field(id, active).await.unwrap();
  let written = writer.await.unwrap();

  let records = s.get_records(id).await.unwrap();
  assert_eq!(records.len(), written);
  assert!(records.iter().all(|r| r.values.len() == 1));
}

#[tokio::test]
async fn datastores_are_independent() {
  let s = MemoryStore::new();
  let a = people(&s).await;
  let b = people(&s).await;

  write(&s, a, vec![RawRecord::new().set("age", 1)]).await;
  s.add_field(b, active_spec()).await.unwrap();

  assert_eq!(s.get_records(a).await.unwrap()[0].values.len(), 1);
  assert!(s.get_records(b).await.unwrap().is_empty());
  assert_eq!(
    s.get_datastore(a).await.unwrap().unwrap().fields.len(),
    1
  );
}
