//! Reconciliation engine: scraped snapshot → minimal store mutations.
//!
//! One pass runs in three steps, all inside a single store transaction:
//!
//! 1. Upsert every successfully scraped lab.
//! 2. Diff the scraped topics against the persisted ones by natural key
//!    `(title, lab_id)`, yielding inserts, reopens and no-ops.
//! 3. Close every open topic of a successfully scraped lab that was not seen
//!    this cycle.
//!
//! Labs whose scrape failed contribute nothing to the snapshot's `labs` list,
//! so the closing pass leaves their topics alone.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  lab::{Lab, LabId, LabUpsert, NewLab},
  snapshot::Snapshot,
  store::{TopicStore, Transaction},
  topic::{NewTopic, ThesisTopic, TopicId, TopicKey, TopicStatus},
};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Counts returned by one synchronize call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
  pub inserted: usize,
  pub skipped:  usize,
  pub reopened: usize,
  pub closed:   usize,
}

/// Counts returned by [`register_labs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabRegistration {
  pub inserted: usize,
  pub skipped:  usize,
}

// ─── Plan ────────────────────────────────────────────────────────────────────

/// The topic mutations needed to converge the store onto a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicPlan {
  pub inserts:    Vec<NewTopic>,
  pub reopen:     Vec<TopicId>,
  pub close:      Vec<TopicId>,
  /// Scraped topics that are already open; nothing to do.
  pub skipped:    usize,
  /// Scraped topics whose lab could not be resolved to an id.
  pub unresolved: usize,
  /// Repeated `(title, lab)` keys within the snapshot, ignored after the first.
  pub duplicates: usize,
}

impl TopicPlan {
  pub fn report(&self) -> SyncReport {
    SyncReport {
      inserted: self.inserts.len(),
      skipped:  self.skipped,
      reopened: self.reopen.len(),
      closed:   self.close.len(),
    }
  }

  pub fn is_noop(&self) -> bool {
    self.inserts.is_empty() && self.reopen.is_empty() && self.close.is_empty()
  }
}

/// Compute the topic mutations for `snapshot` against the persisted state.
///
/// `labs` must already contain every lab in `snapshot.labs`; topics whose lab
/// name does not resolve are skipped with a warning. Scraped topics are
/// visited in snapshot order and persisted topics in the order given, so the
/// resulting plan is deterministic.
pub fn diff_topics(
  snapshot: &Snapshot,
  labs: &[Lab],
  persisted: &[ThesisTopic],
) -> TopicPlan {
  let lab_ids: HashMap<&str, LabId> = labs
    .iter()
    .map(|lab| (lab.name.as_str(), lab.lab_id))
    .collect();
  let existing: HashMap<TopicKey<'_>, &ThesisTopic> =
    persisted.iter().map(|t| (t.key(), t)).collect();

  let mut plan = TopicPlan::default();
  let mut seen: HashSet<TopicKey<'_>> = HashSet::new();

  for topic in &snapshot.topics {
    let Some(&lab_id) = lab_ids.get(topic.lab_name.as_str()) else {
      warn!(
        lab = %topic.lab_name,
        title = %topic.title,
        "lab not found for thesis topic, skipping"
      );
      plan.unresolved += 1;
      continue;
    };

    let key = (topic.title.as_str(), lab_id);
    if !seen.insert(key) {
      debug!(lab = %topic.lab_name, title = %topic.title, "duplicate topic in snapshot");
      plan.duplicates += 1;
      continue;
    }

    match existing.get(&key) {
      Some(current) if current.status == TopicStatus::Closed => {
        plan.reopen.push(current.topic_id);
      }
      Some(_) => plan.skipped += 1,
      None => plan.inserts.push(NewTopic {
        title: topic.title.clone(),
        url: topic.url.clone(),
        lab_id,
      }),
    }
  }

  // Only labs that were scraped this cycle may lose topics.
  let scraped_labs: HashSet<LabId> = snapshot
    .labs
    .iter()
    .filter_map(|lab| lab_ids.get(lab.name.as_str()).copied())
    .collect();

  plan.close = persisted
    .iter()
    .filter(|t| t.status == TopicStatus::Open)
    .filter(|t| scraped_labs.contains(&t.lab_id))
    .filter(|t| !seen.contains(&t.key()))
    .map(|t| t.topic_id)
    .collect();

  plan
}

// ─── Apply ───────────────────────────────────────────────────────────────────

/// Execute `plan` against an open transaction.
pub fn apply<E>(
  tx: &mut dyn Transaction<Error = E>,
  plan: &TopicPlan,
) -> Result<(), E> {
  for new_topic in &plan.inserts {
    let topic = tx.insert_topic(new_topic)?;
    info!(topic_id = topic.topic_id, title = %topic.title, "thesis topic added");
  }
  for &topic_id in &plan.reopen {
    tx.set_topic_status(topic_id, TopicStatus::Open)?;
    info!(topic_id, "reopened closed thesis topic");
  }
  for &topic_id in &plan.close {
    tx.set_topic_status(topic_id, TopicStatus::Closed)?;
    info!(topic_id, "set thesis topic to closed");
  }
  Ok(())
}

fn upsert_lab<E>(
  tx: &mut dyn Transaction<Error = E>,
  lab: &NewLab,
) -> Result<LabUpsert, E> {
  let outcome = tx.upsert_lab(lab)?;
  match &outcome {
    LabUpsert::Created(stored) => {
      info!(lab_id = stored.lab_id, lab = %stored.name, "lab added");
    }
    LabUpsert::Existing(stored) => {
      debug!(lab_id = stored.lab_id, lab = %stored.name, "lab already present");
    }
    LabUpsert::UrlDrift { lab: stored, observed_url } => {
      warn!(
        lab = %stored.name,
        stored_url = %stored.url,
        observed_url = %observed_url,
        "lab URL changed; keeping the stored row"
      );
    }
    LabUpsert::UrlTaken { owner, requested_name } => {
      warn!(
        lab = %requested_name,
        url = %owner.url,
        owner = %owner.name,
        "lab URL already registered under another name; its topics will be skipped"
      );
    }
  }
  Ok(outcome)
}

/// Run one full reconciliation pass inside `tx`.
pub fn reconcile<E>(
  tx: &mut dyn Transaction<Error = E>,
  snapshot: &Snapshot,
) -> Result<SyncReport, E> {
  for lab in &snapshot.labs {
    upsert_lab(tx, &NewLab::new(&lab.name, &lab.url))?;
  }

  let labs = tx.list_labs()?;
  let persisted = tx.list_topics()?;
  let plan = diff_topics(snapshot, &labs, &persisted);

  if plan.unresolved > 0 {
    warn!(count = plan.unresolved, "skipped topics with unresolved labs");
  }
  if plan.is_noop() {
    debug!("store already matches snapshot");
    return Ok(plan.report());
  }
  apply(tx, &plan)?;

  Ok(plan.report())
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Converge `store` onto `snapshot` atomically.
///
/// Either every mutation commits and the full counts are returned, or the
/// store is left exactly as it was and a single error is returned.
pub async fn synchronize_snapshot<S: TopicStore>(
  store: &S,
  snapshot: Snapshot,
) -> Result<SyncReport, S::Error> {
  let report = store
    .transact(move |tx| reconcile(tx, &snapshot))
    .await?;

  info!(
    inserted = report.inserted,
    skipped = report.skipped,
    reopened = report.reopened,
    closed = report.closed,
    "sync operation completed"
  );
  Ok(report)
}

/// Insert every lab in `labs` that is not yet known by name.
pub async fn register_labs<S: TopicStore>(
  store: &S,
  labs: Vec<NewLab>,
) -> Result<LabRegistration, S::Error> {
  store
    .transact(move |tx| {
      let mut counts = LabRegistration::default();
      for lab in &labs {
        if upsert_lab(tx, lab)?.is_created() {
          counts.inserted += 1;
        } else {
          counts.skipped += 1;
        }
      }
      Ok(counts)
    })
    .await
}
