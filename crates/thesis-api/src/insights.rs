//! Read-only aggregate counts. Each endpoint returns a bare JSON value.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use thesis_core::{store::TopicStore, topic::TopicStatus};

use crate::{AppState, error::ApiError};

/// `GET /insights/total_labs`
pub async fn total_labs<S>(State(state): State<AppState<S>>) -> Result<Json<u64>, ApiError>
where
  S: TopicStore + 'static,
{
  Ok(Json(state.store.count_labs().await.map_err(ApiError::store)?))
}

/// `GET /insights/total_open_thesis`
pub async fn total_open<S>(State(state): State<AppState<S>>) -> Result<Json<u64>, ApiError>
where
  S: TopicStore + 'static,
{
  count_status(&state, TopicStatus::Open).await
}

/// `GET /insights/total_closed_thesis`
pub async fn total_closed<S>(State(state): State<AppState<S>>) -> Result<Json<u64>, ApiError>
where
  S: TopicStore + 'static,
{
  count_status(&state, TopicStatus::Closed).await
}

/// `GET /insights/thesis_per_lab`: lab name → topic count, any status.
pub async fn per_lab<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<BTreeMap<String, u64>>, ApiError>
where
  S: TopicStore + 'static,
{
  let counts = state
    .store
    .count_topics_grouped_by_lab()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(counts))
}

async fn count_status<S: TopicStore>(
  state: &AppState<S>,
  status: TopicStatus,
) -> Result<Json<u64>, ApiError> {
  let n = state
    .store
    .count_topics_by_status(status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(n))
}
