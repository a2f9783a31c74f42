//! Thesis topics and their open/closed lifecycle.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, lab::LabId};

/// Store-assigned surrogate key of a [`ThesisTopic`].
pub type TopicId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Whether a topic was present in the latest successful scrape of its lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
  Open,
  Closed,
}

impl TopicStatus {
  /// The string stored in the `status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Closed => "closed",
    }
  }
}

impl fmt::Display for TopicStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TopicStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "open" => Ok(Self::Open),
      "closed" => Ok(Self::Closed),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Topic ───────────────────────────────────────────────────────────────────

/// A persisted thesis topic.
///
/// The natural key is `(title, lab_id)`; `topic_id` is only a surrogate.
/// Topics are never deleted, only flipped between open and closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesisTopic {
  pub topic_id:   TopicId,
  pub title:      String,
  pub url:        String,
  /// Server-assigned timestamp; never changes after creation.
  pub added_date: DateTime<Utc>,
  pub status:     TopicStatus,
  pub lab_id:     LabId,
}

impl ThesisTopic {
  pub fn key(&self) -> TopicKey<'_> { (self.title.as_str(), self.lab_id) }
}

/// Borrowed natural key of a topic.
pub type TopicKey<'a> = (&'a str, LabId);

/// Input to [`crate::store::Transaction::insert_topic`].
/// `added_date` is always set by the store and new topics always start open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
  pub title:  String,
  pub url:    String,
  pub lab_id: LabId,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// One topic as shown in the lab listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
  pub title:  String,
  pub url:    String,
  pub status: TopicStatus,
}

/// A lab together with every topic it has ever advertised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabWithTopics {
  pub lab_name: String,
  pub lab_url:  String,
  pub topics:   Vec<TopicSummary>,
}
