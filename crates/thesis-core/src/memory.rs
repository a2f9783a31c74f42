//! In-memory implementation of [`TopicStore`].
//!
//! All state is held in memory and lost on drop. Transactions run against a
//! copy of the state which replaces the original only on success, giving the
//! same all-or-nothing behaviour as the SQLite backend.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
  Error, Result,
  lab::{Lab, LabId, LabUpsert, NewLab},
  store::{TopicStore, Transaction},
  topic::{LabWithTopics, NewTopic, ThesisTopic, TopicId, TopicStatus, TopicSummary},
};

#[derive(Debug, Clone, Default)]
struct State {
  labs:          Vec<Lab>,
  topics:        Vec<ThesisTopic>,
  next_lab_id:   LabId,
  next_topic_id: TopicId,
}

/// A [`TopicStore`] backed by a mutex-guarded `Vec` pair.
#[derive(Debug, Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

struct MemoryTxn<'a> {
  state: &'a mut State,
}

impl Transaction for MemoryTxn<'_> {
  type Error = Error;

  fn upsert_lab(&mut self, lab: &NewLab) -> Result<LabUpsert> {
    if let Some(existing) = self.state.labs.iter().find(|l| l.name == lab.name) {
      return Ok(if existing.url == lab.url {
        LabUpsert::Existing(existing.clone())
      } else {
        LabUpsert::UrlDrift {
          lab:          existing.clone(),
          observed_url: lab.url.clone(),
        }
      });
    }
    if let Some(owner) = self.state.labs.iter().find(|l| l.url == lab.url) {
      return Ok(LabUpsert::UrlTaken {
        owner:          owner.clone(),
        requested_name: lab.name.clone(),
      });
    }

    self.state.next_lab_id += 1;
    let created = Lab {
      lab_id: self.state.next_lab_id,
      name:   lab.name.clone(),
      url:    lab.url.clone(),
    };
    self.state.labs.push(created.clone());
    Ok(LabUpsert::Created(created))
  }

  fn find_topic(&mut self, title: &str, lab_id: LabId) -> Result<Option<ThesisTopic>> {
    Ok(
      self
        .state
        .topics
        .iter()
        .find(|t| t.title == title && t.lab_id == lab_id)
        .cloned(),
    )
  }

  fn insert_topic(&mut self, topic: &NewTopic) -> Result<ThesisTopic> {
    if !self.state.labs.iter().any(|l| l.lab_id == topic.lab_id) {
      return Err(Error::LabNotFound(topic.lab_id));
    }
    if self.find_topic(&topic.title, topic.lab_id)?.is_some() {
      return Err(Error::UniqueViolation(format!(
        "topics(title, lab_id) = ({:?}, {})",
        topic.title, topic.lab_id
      )));
    }

    self.state.next_topic_id += 1;
    let created = ThesisTopic {
      topic_id:   self.state.next_topic_id,
      title:      topic.title.clone(),
      url:        topic.url.clone(),
      added_date: Utc::now(),
      status:     TopicStatus::Open,
      lab_id:     topic.lab_id,
    };
    self.state.topics.push(created.clone());
    Ok(created)
  }

  fn set_topic_status(&mut self, topic_id: TopicId, status: TopicStatus) -> Result<()> {
    let topic = self
      .state
      .topics
      .iter_mut()
      .find(|t| t.topic_id == topic_id)
      .ok_or(Error::TopicNotFound(topic_id))?;
    topic.status = status;
    Ok(())
  }

  fn list_labs(&mut self) -> Result<Vec<Lab>> { Ok(self.state.labs.clone()) }

  fn list_topics(&mut self) -> Result<Vec<ThesisTopic>> {
    Ok(self.state.topics.clone())
  }
}

impl TopicStore for MemoryStore {
  type Error = Error;

  async fn transact<F, T>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut dyn Transaction<Error = Error>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let mut guard = self.state.lock().await;
    let mut working = guard.clone();
    let out = f(&mut MemoryTxn { state: &mut working })?;
    *guard = working;
    Ok(out)
  }

  async fn list_labs(&self) -> Result<Vec<Lab>> {
    Ok(self.state.lock().await.labs.clone())
  }

  async fn list_topics(&self) -> Result<Vec<ThesisTopic>> {
    Ok(self.state.lock().await.topics.clone())
  }

  async fn count_labs(&self) -> Result<u64> {
    Ok(self.state.lock().await.labs.len() as u64)
  }

  async fn count_topics_by_status(&self, status: TopicStatus) -> Result<u64> {
    let state = self.state.lock().await;
    Ok(state.topics.iter().filter(|t| t.status == status).count() as u64)
  }

  async fn count_topics_grouped_by_lab(&self) -> Result<BTreeMap<String, u64>> {
    let state = self.state.lock().await;
    let mut counts = BTreeMap::new();
    for lab in &state.labs {
      let n = state.topics.iter().filter(|t| t.lab_id == lab.lab_id).count() as u64;
      if n > 0 {
        counts.insert(lab.name.clone(), n);
      }
    }
    Ok(counts)
  }

  async fn list_labs_with_topics(&self) -> Result<Vec<LabWithTopics>> {
    let state = self.state.lock().await;
    Ok(
      state
        .labs
        .iter()
        .map(|lab| LabWithTopics {
          lab_name: lab.name.clone(),
          lab_url:  lab.url.clone(),
          topics:   state
            .topics
            .iter()
            .filter(|t| t.lab_id == lab.lab_id)
            .map(|t| TopicSummary {
              title:  t.title.clone(),
              url:    t.url.clone(),
              status: t.status,
            })
            .collect(),
        })
        .collect(),
    )
  }
}
