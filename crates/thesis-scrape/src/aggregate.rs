//! The snapshot aggregator: one pass over the configured labs.

use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};
use thesis_core::snapshot::{ScrapedItem, Snapshot};
use tracing::{error, info, warn};

use crate::{adapter::AdapterRegistry, artifact, validator::LinkValidator};

/// One entry of the configured lab list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabConfig {
  pub name: String,
  pub url:  String,
}

impl LabConfig {
  pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
    Self { name: name.into(), url: url.into() }
  }
}

/// What happened to a single lab during aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabOutcome {
  /// The adapter ran; the list may be empty.
  Scraped(Vec<ScrapedItem>),
  /// The link check failed, so the adapter never ran.
  InvalidLink,
  /// No adapter is registered under the lab's name.
  Unregistered,
  /// The adapter returned an error.
  Failed(String),
}

impl LabOutcome {
  /// Summary line for this outcome, in the shape callers display verbatim.
  pub fn summary(&self, lab: &LabConfig) -> String {
    match self {
      Self::Scraped(items) => format!("{}: extracted {} items.", lab.name, items.len()),
      Self::InvalidLink => format!("Skipping lab '{}', invalid link: {}", lab.name, lab.url),
      Self::Unregistered => format!("No registered function for '{}', skipping.", lab.name),
      Self::Failed(reason) => format!("Error scraping {}: {reason}", lab.name),
    }
  }
}

/// Validates, scrapes and normalises every configured lab into a
/// [`Snapshot`].
///
/// Labs are processed sequentially in configured order. No single lab can
/// fail the run.
#[derive(Clone)]
pub struct Aggregator {
  validator:    Arc<dyn LinkValidator>,
  registry:     AdapterRegistry,
  artifact_dir: Option<PathBuf>,
}

impl Aggregator {
  pub fn new(validator: Arc<dyn LinkValidator>, registry: AdapterRegistry) -> Self {
    Self { validator, registry, artifact_dir: None }
  }

  /// Also dump every snapshot as a timestamped JSON file into `dir`.
  pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.artifact_dir = Some(dir.into());
    self
  }

  pub fn registry(&self) -> &AdapterRegistry { &self.registry }

  /// Validate and scrape a single lab.
  pub async fn scrape_lab(&self, lab: &LabConfig) -> LabOutcome {
    if !self.validator.is_reachable(&lab.url).await {
      warn!(lab = %lab.name, url = %lab.url, "skipping lab with invalid link");
      return LabOutcome::InvalidLink;
    }

    let Some(adapter) = self.registry.get(&lab.name) else {
      warn!(lab = %lab.name, "no adapter registered");
      return LabOutcome::Unregistered;
    };

    match adapter.scrape(&lab.url).await {
      Ok(items) => {
        info!(lab = %lab.name, count = items.len(), "lab scraped");
        LabOutcome::Scraped(items)
      }
      Err(e) => {
        error!(lab = %lab.name, error = %e, "adapter failed");
        LabOutcome::Failed(e.to_string())
      }
    }
  }

  /// Run one aggregation cycle over `labs`.
  pub async fn run(&self, labs: &[LabConfig]) -> Snapshot {
    let mut snapshot = Snapshot::default();
    if self.registry.is_empty() {
      warn!("no source adapters registered; every lab will be skipped");
    }

    for lab in labs {
      let outcome = self.scrape_lab(lab).await;
      snapshot.summary.push(outcome.summary(lab));
      if let LabOutcome::Scraped(items) = outcome {
        snapshot.push_lab(&lab.name, &lab.url, items);
      }
    }

    info!(
      labs = snapshot.labs.len(),
      topics = snapshot.topics.len(),
      "aggregation finished"
    );

    if let Some(dir) = &self.artifact_dir {
      match artifact::write_snapshot(dir, &snapshot).await {
        Ok(path) => info!(path = %path.display(), "wrote scrape artifact"),
        Err(e) => {
          error!(dir = %dir.display(), error = %e, "failed to write scrape artifact");
          snapshot.summary.push(format!("Failed to write JSON file: {e}"));
        }
      }
    }

    snapshot
  }
}
