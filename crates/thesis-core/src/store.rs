//! The `TopicStore` trait and its transactional mutation surface.
//!
//! The traits are implemented by storage backends (e.g. `thesis-store-sqlite`
//! and [`crate::memory::MemoryStore`]). The reconciliation engine and the API
//! depend on this abstraction, not on any concrete backend.

use std::{collections::BTreeMap, future::Future};

use crate::{
  lab::{Lab, LabId, LabUpsert, NewLab},
  topic::{LabWithTopics, NewTopic, ThesisTopic, TopicId, TopicStatus},
};

// ─── Transaction ─────────────────────────────────────────────────────────────

/// Synchronous view of the store inside one transaction.
///
/// Every mutation made through a `Transaction` commits together when the
/// closure passed to [`TopicStore::transact`] returns `Ok`, and is discarded
/// when it returns `Err`.
pub trait Transaction {
  type Error;

  /// Insert the lab unless one with the same name already exists.
  ///
  /// An existing lab is never modified, even when the URL differs. A URL
  /// already held by a lab of another name yields [`LabUpsert::UrlTaken`]
  /// rather than an error.
  fn upsert_lab(&mut self, lab: &NewLab) -> Result<LabUpsert, Self::Error>;

  /// Look up a topic by its natural key.
  fn find_topic(
    &mut self,
    title: &str,
    lab_id: LabId,
  ) -> Result<Option<ThesisTopic>, Self::Error>;

  /// Insert a new open topic. `added_date` is set by the store.
  fn insert_topic(&mut self, topic: &NewTopic) -> Result<ThesisTopic, Self::Error>;

  /// Flip the status of an existing topic.
  fn set_topic_status(
    &mut self,
    topic_id: TopicId,
    status: TopicStatus,
  ) -> Result<(), Self::Error>;

  fn list_labs(&mut self) -> Result<Vec<Lab>, Self::Error>;

  fn list_topics(&mut self) -> Result<Vec<ThesisTopic>, Self::Error>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over a durable lab/topic store.
///
/// Writes only happen through [`TopicStore::transact`]; the remaining methods
/// are pure reads used by the insights layer.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TopicStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run `f` inside a single all-or-nothing transaction.
  fn transact<F, T>(
    &self,
    f: F,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut dyn Transaction<Error = Self::Error>) -> Result<T, Self::Error>
      + Send
      + 'static,
    T: Send + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn list_labs(
    &self,
  ) -> impl Future<Output = Result<Vec<Lab>, Self::Error>> + Send + '_;

  fn list_topics(
    &self,
  ) -> impl Future<Output = Result<Vec<ThesisTopic>, Self::Error>> + Send + '_;

  fn count_labs(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn count_topics_by_status(
    &self,
    status: TopicStatus,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Topic count (any status) per lab name. Labs without topics are omitted.
  fn count_topics_grouped_by_lab(
    &self,
  ) -> impl Future<Output = Result<BTreeMap<String, u64>, Self::Error>> + Send + '_;

  /// Every lab with all of its topics, ordered by lab id then topic id.
  fn list_labs_with_topics(
    &self,
  ) -> impl Future<Output = Result<Vec<LabWithTopics>, Self::Error>> + Send + '_;
}
