//! JSON REST API for the thesis topic tracker.
//!
//! Exposes an axum [`Router`] backed by any [`thesis_core::store::TopicStore`]
//! and a [`Synchronizer`] bound to the same store. Transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", thesis_api::api_router(state.clone()))
//! ```
//!
//! or use [`app`], which also serves the welcome message at `/`.

pub mod error;
pub mod insights;
pub mod labs;
pub mod sync;
pub mod topics;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Json, Router,
  http::Uri,
  routing::{get, post},
};
use serde_json::{Value, json};
use thesis_core::store::TopicStore;
use thesis_scrape::Synchronizer;
use tokio::sync::Mutex;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub sync:      Synchronizer<S>,
  /// Held for the duration of a synchronize call.
  pub sync_gate: Arc<Mutex<()>>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, sync: Synchronizer<S>) -> Self {
    Self { store, sync, sync_gate: Arc::new(Mutex::new(())) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      sync:      self.sync.clone(),
      sync_gate: self.sync_gate.clone(),
    }
  }
}

/// Build the `/api` router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TopicStore + 'static,
{
  Router::new()
    // Cycles
    .route("/sync", post(sync::synchronize::<S>))
    .route("/scrape", post(sync::scrape::<S>))
    // Labs and topics
    .route("/labs", post(labs::register::<S>))
    .route("/thesis_topics", get(topics::list::<S>))
    // Insights
    .route("/insights/total_labs", get(insights::total_labs::<S>))
    .route("/insights/total_open_thesis", get(insights::total_open::<S>))
    .route("/insights/total_closed_thesis", get(insights::total_closed::<S>))
    .route("/insights/thesis_per_lab", get(insights::per_lab::<S>))
    .fallback(not_found)
    .with_state(state)
}

/// The full application: welcome message at `/`, API under `/api`.
pub fn app<S>(state: AppState<S>) -> Router<()>
where
  S: TopicStore + 'static,
{
  Router::new()
    .route("/", get(welcome))
    .nest("/api", api_router(state))
}

async fn not_found(uri: Uri) -> ApiError { ApiError::NotFound(uri.path().to_owned()) }

async fn welcome() -> Json<Value> {
  Json(json!({ "message": "Welcome to Master Thesis Topics from Different Labs" }))
}
