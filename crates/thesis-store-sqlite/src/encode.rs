//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and statuses as their lowercase
//! names.

use chrono::{DateTime, Utc};
use thesis_core::{
  lab::Lab,
  topic::{ThesisTopic, TopicStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── TopicStatus ─────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<TopicStatus> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const LAB_COLUMNS: &str = "lab_id, lab_name, lab_url";

pub const TOPIC_COLUMNS: &str = "topic_id, title, url, added_date, status, lab_id";

pub fn lab_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lab> {
  Ok(Lab {
    lab_id: row.get(0)?,
    name:   row.get(1)?,
    url:    row.get(2)?,
  })
}

/// Raw values read directly from a `thesis_topics` row.
pub struct RawTopic {
  pub topic_id:   i64,
  pub title:      String,
  pub url:        String,
  pub added_date: String,
  pub status:     String,
  pub lab_id:     i64,
}

impl RawTopic {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      topic_id:   row.get(0)?,
      title:      row.get(1)?,
      url:        row.get(2)?,
      added_date: row.get(3)?,
      status:     row.get(4)?,
      lab_id:     row.get(5)?,
    })
  }

  pub fn into_topic(self) -> Result<ThesisTopic> {
    Ok(ThesisTopic {
      topic_id:   self.topic_id,
      title:      self.title,
      url:        self.url,
      added_date: decode_dt(&self.added_date)?,
      status:     decode_status(&self.status)?,
      lab_id:     self.lab_id,
    })
  }
}
