//! The in-memory result of one scrape cycle.
//!
//! A [`Snapshot`] is produced by the aggregator and consumed by the
//! reconciliation engine. It is never persisted as-is.

use serde::{Deserialize, Serialize};

/// One `{title, link}` record as produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedItem {
  pub title: String,
  pub link:  String,
}

impl ScrapedItem {
  pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
    Self { title: title.into(), link: link.into() }
  }
}

/// A lab whose scrape succeeded this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedLab {
  pub name: String,
  pub url:  String,
}

/// A scraped topic stamped with its owning lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedTopic {
  pub lab_name: String,
  pub lab_url:  String,
  pub title:    String,
  pub url:      String,
}

/// Normalised output of one aggregation run.
///
/// `labs` lists exactly the labs whose adapter succeeded, in configured order,
/// even when they returned no topics. Labs that were skipped or failed appear
/// only in `summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
  pub summary: Vec<String>,
  pub labs:    Vec<ScrapedLab>,
  pub topics:  Vec<ScrapedTopic>,
}

impl Snapshot {
  /// Record a successful lab scrape and flatten its items into `topics`.
  pub fn push_lab(&mut self, name: &str, url: &str, items: Vec<ScrapedItem>) {
    self.labs.push(ScrapedLab { name: name.to_owned(), url: url.to_owned() });
    self.topics.extend(items.into_iter().map(|item| ScrapedTopic {
      lab_name: name.to_owned(),
      lab_url:  url.to_owned(),
      title:    item.title,
      url:      item.link,
    }));
  }
}
