//! The synchronize entry point: aggregate, then reconcile into the store.

use std::sync::Arc;

use thesis_core::{
  reconcile::{SyncReport, synchronize_snapshot},
  snapshot::Snapshot,
  store::TopicStore,
};
use tracing::info;

use crate::aggregate::{Aggregator, LabConfig};

/// Binds an [`Aggregator`], the configured lab list and a store.
pub struct Synchronizer<S> {
  aggregator: Aggregator,
  store:      Arc<S>,
  labs:       Vec<LabConfig>,
}

impl<S> Clone for Synchronizer<S> {
  fn clone(&self) -> Self {
    Self {
      aggregator: self.aggregator.clone(),
      store:      self.store.clone(),
      labs:       self.labs.clone(),
    }
  }
}

impl<S: TopicStore> Synchronizer<S> {
  pub fn new(aggregator: Aggregator, store: Arc<S>, labs: Vec<LabConfig>) -> Self {
    Self { aggregator, store, labs }
  }

  pub fn labs(&self) -> &[LabConfig] { &self.labs }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Scrape every configured lab without touching the store.
  pub async fn scrape(&self) -> Snapshot { self.aggregator.run(&self.labs).await }

  /// One full cycle. Scrape failures are absorbed into the snapshot; only a
  /// store failure is returned, in which case nothing was persisted.
  pub async fn synchronize(&self) -> Result<SyncReport, S::Error> {
    let snapshot = self.scrape().await;
    for line in &snapshot.summary {
      info!("{line}");
    }
    synchronize_snapshot(self.store.as_ref(), snapshot).await
  }
}
