//! Handlers that run a scrape cycle.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sync` | Scrape and reconcile; 409 while another sync runs |
//! | `POST` | `/scrape` | Scrape only; returns the snapshot |

use axum::{Json, extract::State};
use serde::Serialize;
use thesis_core::{reconcile::SyncReport, snapshot::Snapshot, store::TopicStore};
use tracing::info;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SyncResponse {
  pub status: &'static str,
  #[serde(flatten)]
  pub report: SyncReport,
}

/// `POST /sync`
pub async fn synchronize<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<SyncResponse>, ApiError>
where
  S: TopicStore + 'static,
{
  let Ok(_guard) = state.sync_gate.try_lock() else {
    info!("rejecting overlapping sync request");
    return Err(ApiError::SyncInProgress);
  };

  let report = state.sync.synchronize().await.map_err(ApiError::store)?;
  Ok(Json(SyncResponse { status: "success", report }))
}

/// `POST /scrape`
pub async fn scrape<S>(State(state): State<AppState<S>>) -> Json<Snapshot>
where
  S: TopicStore + 'static,
{
  Json(state.sync.scrape().await)
}
