//! `GET /thesis_topics`: every lab with its topics, open and closed.

use axum::{Json, extract::State};
use thesis_core::{store::TopicStore, topic::LabWithTopics};

use crate::{AppState, error::ApiError};

pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<LabWithTopics>>, ApiError>
where
  S: TopicStore + 'static,
{
  let labs = state.store.list_labs_with_topics().await.map_err(ApiError::store)?;
  Ok(Json(labs))
}
