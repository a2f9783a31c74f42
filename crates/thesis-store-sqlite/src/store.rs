//! [`SqliteStore`]: the SQLite implementation of [`TopicStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use thesis_core::{
  lab::{Lab, LabId, LabUpsert, NewLab},
  store::{TopicStore, Transaction},
  topic::{LabWithTopics, NewTopic, ThesisTopic, TopicId, TopicStatus, TopicSummary},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{LAB_COLUMNS, RawTopic, TOPIC_COLUMNS, decode_status, encode_dt, lab_from_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A thesis topic store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count(&self, sql: &'static str, param: Option<&'static str>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        let n = match param {
          Some(p) => conn.query_row(sql, rusqlite::params![p], |r| r.get(0))?,
          None => conn.query_row(sql, [], |r| r.get(0))?,
        };
        Ok(n)
      })
      .await?;
    Ok(n as u64)
  }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// The mutation surface handed to [`TopicStore::transact`] closures. Borrows
/// the open `rusqlite::Transaction` through its `Connection` deref.
struct SqliteTxn<'a> {
  conn: &'a rusqlite::Connection,
}

impl SqliteTxn<'_> {
  fn lab_where(&self, column: &str, value: &str) -> Result<Option<Lab>> {
    Ok(
      self
        .conn
        .query_row(
          &format!("SELECT {LAB_COLUMNS} FROM labs WHERE {column} = ?1"),
          rusqlite::params![value],
          lab_from_row,
        )
        .optional()?,
    )
  }
}

impl Transaction for SqliteTxn<'_> {
  type Error = Error;

  fn upsert_lab(&mut self, lab: &NewLab) -> Result<LabUpsert> {
    match self.lab_where("lab_name", &lab.name)? {
      Some(existing) if existing.url == lab.url => Ok(LabUpsert::Existing(existing)),
      Some(existing) => Ok(LabUpsert::UrlDrift {
        lab:          existing,
        observed_url: lab.url.clone(),
      }),
      None => {
        // `lab_url` is UNIQUE; report the clash instead of failing the insert.
        if let Some(owner) = self.lab_where("lab_url", &lab.url)? {
          return Ok(LabUpsert::UrlTaken { owner, requested_name: lab.name.clone() });
        }
        self.conn.execute(
          "INSERT INTO labs (lab_name, lab_url) VALUES (?1, ?2)",
          rusqlite::params![lab.name, lab.url],
        )?;
        Ok(LabUpsert::Created(Lab {
          lab_id: self.conn.last_insert_rowid(),
          name:   lab.name.clone(),
          url:    lab.url.clone(),
        }))
      }
    }
  }

  fn find_topic(&mut self, title: &str, lab_id: LabId) -> Result<Option<ThesisTopic>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {TOPIC_COLUMNS} FROM thesis_topics WHERE title = ?1 AND lab_id = ?2"
        ),
        rusqlite::params![title, lab_id],
        RawTopic::from_row,
      )
      .optional()?;
    raw.map(RawTopic::into_topic).transpose()
  }

  fn insert_topic(&mut self, topic: &NewTopic) -> Result<ThesisTopic> {
    let added_date = Utc::now();
    self.conn.execute(
      "INSERT INTO thesis_topics (title, url, added_date, status, lab_id)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        topic.title,
        topic.url,
        encode_dt(added_date),
        TopicStatus::Open.as_str(),
        topic.lab_id,
      ],
    )?;

    Ok(ThesisTopic {
      topic_id: self.conn.last_insert_rowid(),
      title: topic.title.clone(),
      url: topic.url.clone(),
      added_date,
      status: TopicStatus::Open,
      lab_id: topic.lab_id,
    })
  }

  fn set_topic_status(&mut self, topic_id: TopicId, status: TopicStatus) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE thesis_topics SET status = ?1 WHERE topic_id = ?2",
      rusqlite::params![status.as_str(), topic_id],
    )?;
    if changed == 0 {
      return Err(Error::TopicNotFound(topic_id));
    }
    Ok(())
  }

  fn list_labs(&mut self) -> Result<Vec<Lab>> {
    let mut stmt = self
      .conn
      .prepare(&format!("SELECT {LAB_COLUMNS} FROM labs ORDER BY lab_id"))?;
    let labs = stmt
      .query_map([], lab_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(labs)
  }

  fn list_topics(&mut self) -> Result<Vec<ThesisTopic>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {TOPIC_COLUMNS} FROM thesis_topics ORDER BY topic_id"
    ))?;
    let raws = stmt
      .query_map([], RawTopic::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawTopic::into_topic).collect()
  }
}

// ─── TopicStore impl ─────────────────────────────────────────────────────────

impl TopicStore for SqliteStore {
  type Error = Error;

  async fn transact<F, T>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut dyn Transaction<Error = Error>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&mut SqliteTxn { conn: &tx });
        match &out {
          Ok(_) => tx.commit()?,
          // Dropping `tx` without committing rolls it back.
          Err(e) => debug!(error = %e, "rolling back transaction"),
        }
        Ok(out)
      })
      .await?;
    out
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_labs(&self) -> Result<Vec<Lab>> {
    self.transact(|tx| tx.list_labs()).await
  }

  async fn list_topics(&self) -> Result<Vec<ThesisTopic>> {
    self.transact(|tx| tx.list_topics()).await
  }

  async fn count_labs(&self) -> Result<u64> {
    self.count("SELECT COUNT(*) FROM labs", None).await
  }

  async fn count_topics_by_status(&self, status: TopicStatus) -> Result<u64> {
    self
      .count(
        "SELECT COUNT(*) FROM thesis_topics WHERE status = ?1",
        Some(status.as_str()),
      )
      .await
  }

  async fn count_topics_grouped_by_lab(&self) -> Result<BTreeMap<String, u64>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT l.lab_name, COUNT(t.topic_id)
           FROM labs l
           JOIN thesis_topics t ON t.lab_id = l.lab_id
           GROUP BY l.lab_name",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|(name, n)| (name, n as u64)).collect())
  }

  async fn list_labs_with_topics(&self) -> Result<Vec<LabWithTopics>> {
    let (labs, rows): (Vec<Lab>, Vec<(LabId, String, String, String)>) = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {LAB_COLUMNS} FROM labs ORDER BY lab_id"))?;
        let labs = stmt
          .query_map([], lab_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT lab_id, title, url, status FROM thesis_topics ORDER BY topic_id",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((labs, rows))
      })
      .await?;

    let mut by_lab: BTreeMap<LabId, Vec<TopicSummary>> = BTreeMap::new();
    for (lab_id, title, url, status) in rows {
      by_lab.entry(lab_id).or_default().push(TopicSummary {
        title,
        url,
        status: decode_status(&status)?,
      });
    }

    Ok(
      labs
        .into_iter()
        .map(|lab| LabWithTopics {
          topics:   by_lab.remove(&lab.lab_id).unwrap_or_default(),
          lab_name: lab.name,
          lab_url:  lab.url,
        })
        .collect(),
    )
  }
}
