//! Router tests driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tabula_core::validate::ValidationMode;
use tabula_store_memory::MemoryStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

fn app() -> Router { api_router(Arc::new(MemoryStore::new()), ValidationMode::Strict) }

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn create_people(app: &Router) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/datastores",
    Some(json!({
      "name": "people",
      "fields": [{ "name": "age", "type": "number", "default": 0 }]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["datastore_id"].as_str().unwrap().to_owned()
}

// ─── Datastores ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_list_get_rename_delete() {
  let app = app();
  let id = create_people(&app).await;

  let (status, body) = send(&app, "GET", "/datastores", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (status, body) = send(&app, "GET", &format!("/datastores/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["fields"][0]["name"], "age");
  assert_eq!(body["fields"][0]["type"], "number");

  let (status, body) = send(
    &app,
    "PATCH",
    &format!("/datastores/{id}"),
    Some(json!({ "name": "humans" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "humans");

  let (status, body) = send(&app, "DELETE", &format!("/datastores/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "success": true }));

  let (status, _) = send(&app, "DELETE", &format!("/datastores/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_datastore_is_404() {
  let app = app();
  let id = Uuid::new_v4();
  for (method, uri) in [
    ("GET", format!("/datastores/{id}")),
    ("GET", format!("/datastores/{id}/records")),
  ] {
    let (status, body) = send(&app, method, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    assert!(body["error"].is_string());
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn field_errors_map_to_status_codes() {
  let app = app();
  let id = create_people(&app).await;
  let columns = format!("/datastores/{id}/columns");

  let (status, _) = send(
    &app,
    "POST",
    &columns,
    Some(json!({ "name": "age", "type": "string", "default": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(
    &app,
    "POST",
    &columns,
    Some(json!({ "name": "id", "type": "string", "default": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    "POST",
    &columns,
    Some(json!({ "name": "active", "type": "boolean", "default": "maybe" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) =
    send(&app, "DELETE", &format!("{columns}/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_and_remove_field_reshapes_records() {
  let app = app();
  let id = create_people(&app).await;
  let records = format!("/datastores/{id}/records");
  send(&app, "POST", &records, Some(json!({ "records": [{ "age": 30 }] }))).await;

  let (status, ds) = send(
    &app,
    "POST",
    &format!("/datastores/{id}/columns"),
    Some(json!({ "name": "active", "type": "boolean", "default": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let active = ds["fields"][1]["field_id"].as_str().unwrap().to_owned();

  let (_, rows) = send(&app, "GET", &records, None).await;
  assert_eq!(rows[0]["values"][&active], true);

  let (status, body) = send(
    &app,
    "DELETE",
    &format!("/datastores/{id}/columns/{active}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "success": true }));

  let (_, rows) = send(&app, "GET", &records, None).await;
  assert!(rows[0]["values"].get(&active).is_none());
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_batch_returns_400_with_findings() {
  let app = app();
  let id = create_people(&app).await;
  let records = format!("/datastores/{id}/records");

  let (status, body) = send(
    &app,
    "POST",
    &records,
    Some(json!({ "records": [{ "age": 30 }, { "age": "x" }] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["total"], 2);
  assert_eq!(body["records"][0]["index"], 1);
  assert_eq!(
    body["records"][0]["findings"][0],
    json!({ "field": "age", "code": "type_mismatch", "expected": "number" })
  );

  let (_, rows) = send(&app, "GET", &records, None).await;
  assert_eq!(rows, json!([]));
}

#[tokio::test]
async fn write_mode_can_be_chosen_per_request() {
  let app = app();
  let id = create_people(&app).await;
  let records = format!("/datastores/{id}/records");
  let batch = json!({ "records": [{ "extra": 1 }] });

  let (status, _) = send(&app, "POST", &records, Some(batch.clone())).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    send(&app, "POST", &format!("{records}?mode=lenient"), Some(batch)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["record_ids"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_record() {
  let app = app();
  let id = create_people(&app).await;
  let records = format!("/datastores/{id}/records");
  let record_id = Uuid::new_v4();

  let (status, _) = send(
    &app,
    "POST",
    &records,
    Some(json!({ "records": [{ "id": record_id, "age": 1 }] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let uri = format!("{records}/{record_id}");
  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_record_id_is_reported_per_record() {
  let app = app();
  let id = create_people(&app).await;
  let records = format!("/datastores/{id}/records");

  let (status, body) = send(
    &app,
    "POST",
    &records,
    Some(json!({ "records": [{ "age": 1 }, { "id": "row-2", "age": 2 }] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(
    body,
    json!({
      "total": 2,
      "records": [{
        "index": 1,
        "id": "row-2",
        "findings": [{ "field": "id", "code": "invalid_id" }]
      }]
    })
  );

  let (_, rows) = send(&app, "GET", &records, None).await;
  assert_eq!(rows, json!([]));
}

#[tokio::test]
async fn unparseable_ids_in_the_path_are_404() {
  let app = app();
  let id = create_people(&app).await;
  for (method, uri) in [
    ("GET", "/datastores/people".to_owned()),
    ("DELETE", "/datastores/people".to_owned()),
    ("DELETE", format!("/datastores/{id}/columns/age")),
    ("DELETE", format!("/datastores/{id}/records/row-1")),
  ] {
    let (status, body) = send(&app, method, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    assert!(body["error"].is_string());
  }
}
