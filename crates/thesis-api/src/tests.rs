use std::sync::Arc;

use async_trait::async_trait;
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use thesis_core::{memory::MemoryStore, snapshot::ScrapedItem};
use thesis_scrape::{
  AdapterRegistry, Aggregator, LabConfig, LinkValidator, SourceAdapter, Synchronizer,
};
use tower::ServiceExt as _;

use super::*;

struct AlwaysUp;

#[async_trait]
impl LinkValidator for AlwaysUp {
  async fn is_reachable(&self, _url: &str) -> bool { true }
}

struct Fixed(Vec<ScrapedItem>);

#[async_trait]
impl SourceAdapter for Fixed {
  async fn scrape(&self, _url: &str) -> thesis_scrape::Result<Vec<ScrapedItem>> {
    Ok(self.0.clone())
  }
}

fn make_state() -> AppState<MemoryStore> {
  let store = Arc::new(MemoryStore::new());
  let mut registry = AdapterRegistry::new();
  registry
    .register(
      "MAD",
      Arc::new(Fixed(vec![
        ScrapedItem::new("Learning dynamics", "https://mad/ld"),
        ScrapedItem::new("Robust control", "https://mad/rc"),
      ])),
    )
    .register("ASM", Arc::new(Fixed(vec![ScrapedItem::new("Beams", "https://asm/b")])));
  let sync = Synchronizer::new(
    Aggregator::new(Arc::new(AlwaysUp), registry),
    store.clone(),
    vec![
      LabConfig::new("MAD", "https://mad"),
      LabConfig::new("ASM", "https://asm"),
      LabConfig::new("Ghost", "https://ghost"),
    ],
  );
  AppState::new(store, sync)
}

async fn call(
  state: AppState<MemoryStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app(state).oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

#[tokio::test]
async fn root_says_welcome() {
  let (status, body) = call(make_state(), "GET", "/", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["message"].as_str().unwrap().starts_with("Welcome"));
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
  let (status, body) = call(make_state(), "GET", "/api/thesis", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().starts_with("not found: "));
}

#[tokio::test]
async fn sync_reports_counts_then_is_idempotent() {
  let state = make_state();

  let (status, body) = call(state.clone(), "POST", "/api/sync", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!({ "status": "success", "inserted": 3, "skipped": 0, "reopened": 0, "closed": 0 })
  );

  let (_, body) = call(state, "POST", "/api/sync", None).await;
  assert_eq!(body["inserted"], 0);
  assert_eq!(body["skipped"], 3);
}

#[tokio::test]
async fn overlapping_sync_is_rejected() {
  let state = make_state();
  let _held = state.sync_gate.clone().lock_owned().await;

  let (status, body) = call(state.clone(), "POST", "/api/sync", None).await;

  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().is_some());
  assert_eq!(state.store.count_labs().await.unwrap(), 0);
}

#[tokio::test]
async fn scrape_returns_snapshot_without_persisting() {
  let state = make_state();

  let (status, body) = call(state.clone(), "POST", "/api/scrape", None).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["labs"].as_array().unwrap().len(), 2);
  assert_eq!(body["topics"].as_array().unwrap().len(), 3);
  assert_eq!(
    body["summary"][2],
    "No registered function for 'Ghost', skipping."
  );
  assert_eq!(state.store.count_labs().await.unwrap(), 0);
}

#[tokio::test]
async fn labs_are_registered_once() {
  let state = make_state();
  let labs = json!([
    { "lab_name": "MAD", "lab_url": "https://mad" },
    { "lab_name": "Quiet", "lab_url": "https://quiet" },
  ]);

  let (status, body) = call(state.clone(), "POST", "/api/labs", Some(labs.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "success", "inserted": 2, "skipped": 0 }));

  let (_, body) = call(state, "POST", "/api/labs", Some(labs)).await;
  assert_eq!(body["inserted"], 0);
  assert_eq!(body["skipped"], 2);
}

#[tokio::test]
async fn blank_lab_name_is_bad_request() {
  let labs = json!([{ "lab_name": " ", "lab_url": "https://x" }]);
  let (status, body) = call(make_state(), "POST", "/api/labs", Some(labs)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("non-empty"));
}

#[tokio::test]
async fn insights_reflect_store_contents() {
  let state = make_state();
  call(
    state.clone(),
    "POST",
    "/api/labs",
    Some(json!([{ "lab_name": "Quiet", "lab_url": "https://quiet" }])),
  )
  .await;
  call(state.clone(), "POST", "/api/sync", None).await;

  let (_, labs) = call(state.clone(), "GET", "/api/insights/total_labs", None).await;
  let (_, open) = call(state.clone(), "GET", "/api/insights/total_open_thesis", None).await;
  let (_, closed) = call(state.clone(), "GET", "/api/insights/total_closed_thesis", None).await;
  let (_, per_lab) = call(state, "GET", "/api/insights/thesis_per_lab", None).await;

  assert_eq!(labs, json!(3));
  assert_eq!(open, json!(3));
  assert_eq!(closed, json!(0));
  assert_eq!(per_lab, json!({ "ASM": 1, "MAD": 2 }));
}

#[tokio::test]
async fn thesis_topics_are_grouped_by_lab() {
  let state = make_state();
  call(state.clone(), "POST", "/api/sync", None).await;

  let (status, body) = call(state, "GET", "/api/thesis_topics", None).await;

  assert_eq!(status, StatusCode::OK);
  let mad = body
    .as_array()
    .unwrap()
    .iter()
    .find(|l| l["lab_name"] == "MAD")
    .unwrap();
  assert_eq!(mad["lab_url"], "https://mad");
  assert_eq!(mad["topics"].as_array().unwrap().len(), 2);
  assert_eq!(mad["topics"][0]["status"], "open");
}
