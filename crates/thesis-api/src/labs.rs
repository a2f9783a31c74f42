//! `POST /labs`: register labs ahead of any scrape.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use thesis_core::{
  lab::NewLab,
  reconcile::{LabRegistration, register_labs},
  store::TopicStore,
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LabBody {
  pub lab_name: String,
  pub lab_url:  String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub status: &'static str,
  #[serde(flatten)]
  pub counts: LabRegistration,
}

/// `POST /labs` with body `[{"lab_name":..,"lab_url":..}, ..]`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Vec<LabBody>>,
) -> Result<Json<RegisterResponse>, ApiError>
where
  S: TopicStore + 'static,
{
  let blank = |l: &&LabBody| l.lab_name.trim().is_empty() || l.lab_url.trim().is_empty();
  if let Some(bad) = body.iter().find(blank) {
    return Err(ApiError::BadRequest(format!(
      "lab name and url must be non-empty (got {:?}, {:?})",
      bad.lab_name, bad.lab_url
    )));
  }

  let labs = body.into_iter().map(|l| NewLab::new(l.lab_name, l.lab_url)).collect();
  let counts = register_labs(state.store.as_ref(), labs)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(RegisterResponse { status: "success", counts }))
}
