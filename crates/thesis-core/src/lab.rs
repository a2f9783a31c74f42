//! Labs: research groups whose page is scraped for thesis postings.
//!
//! Labs are created by the store the first time they are observed and are
//! never updated afterwards.

use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key of a [`Lab`].
pub type LabId = i64;

/// A persisted lab row. Both `name` and `url` are unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
  pub lab_id: LabId,
  pub name:   String,
  pub url:    String,
}

/// Input to [`crate::store::Transaction::upsert_lab`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLab {
  pub name: String,
  pub url:  String,
}

impl NewLab {
  pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
    Self { name: name.into(), url: url.into() }
  }
}

/// What [`crate::store::Transaction::upsert_lab`] did with a lab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabUpsert {
  /// No lab with this name existed; a new row was inserted.
  Created(Lab),
  /// A lab with the same `(name, url)` pair already existed.
  Existing(Lab),
  /// A lab with this name exists under a different URL. The stored row is
  /// left untouched.
  UrlDrift { lab: Lab, observed_url: String },
  /// No lab with this name exists, but its URL already belongs to `owner`.
  /// Nothing was inserted.
  UrlTaken { owner: Lab, requested_name: String },
}

impl LabUpsert {
  /// The stored lab the upsert resolved to. For [`LabUpsert::UrlTaken`] this
  /// is the lab owning the URL, not one with the requested name.
  pub fn lab(&self) -> &Lab {
    match self {
      Self::Created(lab) | Self::Existing(lab) => lab,
      Self::UrlDrift { lab, .. } => lab,
      Self::UrlTaken { owner, .. } => owner,
    }
  }

  pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }
}
