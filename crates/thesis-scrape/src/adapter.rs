//! The source-adapter contract and the name → adapter registry.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thesis_core::snapshot::ScrapedItem;

use crate::Result;

/// Site-specific extraction of `{title, link}` records from one lab page.
///
/// Recoverable anomalies (a missing heading, format drift) should produce an
/// empty or partial list. An `Err` is reserved for failures that make the
/// whole lab unusable this cycle, such as the page not loading.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
  async fn scrape(&self, url: &str) -> Result<Vec<ScrapedItem>>;
}

/// Lab name → adapter lookup. Unregistered names resolve to `None`.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
  adapters: HashMap<String, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
  pub fn new() -> Self { Self::default() }

  /// Register `adapter` under `lab_name`, replacing any previous entry.
  pub fn register(
    &mut self,
    lab_name: impl Into<String>,
    adapter: Arc<dyn SourceAdapter>,
  ) -> &mut Self {
    self.adapters.insert(lab_name.into(), adapter);
    self
  }

  pub fn get(&self, lab_name: &str) -> Option<Arc<dyn SourceAdapter>> {
    self.adapters.get(lab_name).cloned()
  }

  pub fn len(&self) -> usize { self.adapters.len() }

  pub fn is_empty(&self) -> bool { self.adapters.is_empty() }
}
