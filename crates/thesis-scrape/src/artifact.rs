//! Timestamped JSON dumps of a snapshot, for inspecting what a cycle saw.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thesis_core::snapshot::{ScrapedLab, ScrapedTopic, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

/// The summary is left out; it is returned to the caller instead.
#[derive(Serialize)]
struct Artifact<'a> {
  labs:   &'a [ScrapedLab],
  topics: &'a [ScrapedTopic],
}

/// File name for an artifact written now.
pub fn artifact_file_name() -> String {
  format!("scrape_results_{}.json", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Write `{labs, topics}` of `snapshot` as pretty JSON into `dir`, creating
/// the directory if needed. Returns the path written.
pub async fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<PathBuf, ArtifactError> {
  let body = serde_json::to_vec_pretty(&Artifact {
    labs:   &snapshot.labs,
    topics: &snapshot.topics,
  })?;

  tokio::fs::create_dir_all(dir).await?;
  let path = dir.join(artifact_file_name());
  tokio::fs::write(&path, body).await?;
  Ok(path)
}
