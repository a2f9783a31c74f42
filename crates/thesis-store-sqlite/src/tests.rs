//! Integration tests for `SqliteStore` against an in-memory database.

use thesis_core::{
  lab::{Lab, LabId, LabUpsert, NewLab},
  reconcile::{reconcile, register_labs, synchronize_snapshot},
  snapshot::{ScrapedItem, Snapshot},
  store::{TopicStore, Transaction},
  topic::{NewTopic, ThesisTopic, TopicId, TopicStatus},
};

use crate::{Error, Result, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn snapshot(labs: &[(&str, &str, &[&str])]) -> Snapshot {
  let mut snap = Snapshot::default();
  for (name, url, titles) in labs {
    let items = titles
      .iter()
      .map(|t| ScrapedItem::new(*t, format!("{url}/{t}")))
      .collect();
    snap.push_lab(name, url, items);
  }
  snap
}

// ─── Labs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_lab_creates_then_finds_existing() {
  let s = store().await;
  let lab = NewLab::new("MAD", "https://mad.example");

  let (first, second) = s
    .transact(move |tx| Ok((tx.upsert_lab(&lab)?, tx.upsert_lab(&lab)?)))
    .await
    .unwrap();

  let LabUpsert::Created(created) = first else {
    panic!("expected Created, got {first:?}");
  };
  assert_eq!(second, LabUpsert::Existing(created.clone()));
  assert_eq!(s.list_labs().await.unwrap(), vec![created]);
}

#[tokio::test]
async fn upsert_lab_reports_url_drift_without_writing() {
  let s = store().await;
  register_labs(&s, vec![NewLab::new("MAD", "https://old.example")])
    .await
    .unwrap();

  let outcome = s
    .transact(|tx| tx.upsert_lab(&NewLab::new("MAD", "https://new.example")))
    .await
    .unwrap();

  match outcome {
    LabUpsert::UrlDrift { lab, observed_url } => {
      assert_eq!(lab.url, "https://old.example");
      assert_eq!(observed_url, "https://new.example");
    }
    other => panic!("expected UrlDrift, got {other:?}"),
  }
  assert_eq!(s.count_labs().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_lab_url_is_skipped() {
  let s = store().await;
  let counts = register_labs(
    &s,
    vec![NewLab::new("A", "https://same.example"), NewLab::new("B", "https://same.example")],
  )
  .await
  .unwrap();

  assert_eq!((counts.inserted, counts.skipped), (1, 1));
  let labs = s.list_labs().await.unwrap();
  assert_eq!(labs.len(), 1);
  assert_eq!(labs[0].name, "A");
}

#[tokio::test]
async fn taken_url_does_not_abort_other_labs() {
  let s = store().await;
  register_labs(&s, vec![NewLab::new("Other name", "https://a.example")])
    .await
    .unwrap();

  let report = synchronize_snapshot(
    &s,
    snapshot(&[("A", "https://a.example", &["T1"]), ("B", "https://b.example", &["T2"])]),
  )
  .await
  .unwrap();

  assert_eq!(report.inserted, 1);
  let topics = s.list_topics().await.unwrap();
  assert_eq!(topics.len(), 1);
  assert_eq!(topics[0].title, "T2");
  assert_eq!(s.count_labs().await.unwrap(), 2);
}

// ─── Topics ──────────────────────────────────────────────────────────────────

async fn lab(s: &SqliteStore, name: &str) -> Lab {
  let new_lab = NewLab::new(name, format!("https://{name}.example"));
  s.transact(move |tx| Ok(tx.upsert_lab(&new_lab)?.lab().clone()))
    .await
    .unwrap()
}

#[tokio::test]
async fn insert_and_find_topic() {
  let s = store().await;
  let lab_id = lab(&s, "pr").await.lab_id;

  let inserted = s
    .transact(move |tx| {
      tx.insert_topic(&NewTopic {
        title:  "Graph learning".into(),
        url:    "https://pr.example/graph".into(),
        lab_id,
      })
    })
    .await
    .unwrap();
  assert_eq!(inserted.status, TopicStatus::Open);

  let found = s
    .transact(move |tx| tx.find_topic("Graph learning", lab_id))
    .await
    .unwrap()
    .expect("topic present");
  assert_eq!(found, inserted);

  let missing = s
    .transact(move |tx| tx.find_topic("Graph learning", lab_id + 1))
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn duplicate_topic_key_is_rejected() {
  let s = store().await;
  let l = lab(&s, "pr").await;
  let topic = NewTopic { title: "T".into(), url: "u".into(), lab_id: l.lab_id };

  let result = s
    .transact(move |tx| {
      tx.insert_topic(&topic)?;
      tx.insert_topic(&topic)
    })
    .await;

  assert!(matches!(result, Err(Error::Sqlite(_))));
  assert!(s.list_topics().await.unwrap().is_empty());
}

#[tokio::test]
async fn topic_requires_existing_lab() {
  let s = store().await;
  let result = s
    .transact(|tx| {
      tx.insert_topic(&NewTopic { title: "T".into(), url: "u".into(), lab_id: 42 })
    })
    .await;
  assert!(result.is_err());
}

#[tokio::test]
async fn set_status_on_missing_topic_fails() {
  let s = store().await;
  let result = s
    .transact(|tx| tx.set_topic_status(7, TopicStatus::Closed))
    .await;
  assert!(matches!(result, Err(Error::TopicNotFound(7))));
}

#[tokio::test]
async fn failing_closure_rolls_back() {
  let s = store().await;
  let result: Result<()> = s
    .transact(|tx| {
      tx.upsert_lab(&NewLab::new("A", "https://a.example"))?;
      Err(Error::TopicNotFound(0))
    })
    .await;

  assert!(result.is_err());
  assert_eq!(s.count_labs().await.unwrap(), 0);
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn full_lifecycle_through_sqlite() {
  let s = store().await;

  let first = synchronize_snapshot(&s, snapshot(&[("L", "https://l.example", &["T1", "T2"])]))
    .await
    .unwrap();
  assert_eq!((first.inserted, first.closed), (2, 0));

  let second = synchronize_snapshot(&s, snapshot(&[("L", "https://l.example", &["T2"])]))
    .await
    .unwrap();
  assert_eq!((second.skipped, second.closed), (1, 1));

  let third = synchronize_snapshot(&s, snapshot(&[("L", "https://l.example", &["T1", "T2"])]))
    .await
    .unwrap();
  assert_eq!((third.reopened, third.skipped, third.inserted), (1, 1, 0));

  assert_eq!(s.count_topics_by_status(TopicStatus::Open).await.unwrap(), 2);
  assert_eq!(s.count_topics_by_status(TopicStatus::Closed).await.unwrap(), 0);
}

/// Forwards to a real transaction but fails every mutation after `budget`.
struct FailAfter<'a> {
  inner:  &'a mut dyn Transaction<Error = Error>,
  budget: usize,
}

impl FailAfter<'_> {
  fn spend(&mut self) -> Result<()> {
    if self.budget == 0 {
      return Err(Error::DateParse("injected failure".into()));
    }
    self.budget -= 1;
    Ok(())
  }
}

impl Transaction for FailAfter<'_> {
  type Error = Error;

  fn upsert_lab(&mut self, lab: &NewLab) -> Result<LabUpsert> {
    self.spend()?;
    self.inner.upsert_lab(lab)
  }

  fn find_topic(&mut self, title: &str, lab_id: LabId) -> Result<Option<ThesisTopic>> {
    self.inner.find_topic(title, lab_id)
  }

  fn insert_topic(&mut self, topic: &NewTopic) -> Result<ThesisTopic> {
    self.spend()?;
    self.inner.insert_topic(topic)
  }

  fn set_topic_status(&mut self, topic_id: TopicId, status: TopicStatus) -> Result<()> {
    self.spend()?;
    self.inner.set_topic_status(topic_id, status)
  }

  fn list_labs(&mut self) -> Result<Vec<Lab>> { self.inner.list_labs() }

  fn list_topics(&mut self) -> Result<Vec<ThesisTopic>> { self.inner.list_topics() }
}

#[tokio::test]
async fn injected_failure_mid_pass_leaves_tables_identical() {
  let s = store().await;
  synchronize_snapshot(&s, snapshot(&[("L", "https://l.example", &["T1", "T2"])]))
    .await
    .unwrap();
  let labs_before = s.list_labs().await.unwrap();
  let topics_before = s.list_topics().await.unwrap();

  // upsert L, upsert M, insert T3 succeed; insert M1 fails.
  let snap = snapshot(&[
    ("L", "https://l.example", &["T3"]),
    ("M", "https://m.example", &["M1"]),
  ]);
  let result = s
    .transact(move |tx| reconcile::<Error>(&mut FailAfter { inner: tx, budget: 3 }, &snap))
    .await;

  assert!(result.is_err());
  assert_eq!(s.list_labs().await.unwrap(), labs_before);
  assert_eq!(s.list_topics().await.unwrap(), topics_before);
}

// ─── Insights ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn grouped_counts_and_listing() {
  let s = store().await;
  register_labs(&s, vec![NewLab::new("Empty", "https://empty.example")])
    .await
    .unwrap();
  synchronize_snapshot(
    &s,
    snapshot(&[
      ("A", "https://a.example", &["A1", "A2"]),
      ("B", "https://b.example", &["B1"]),
    ]),
  )
  .await
  .unwrap();
  synchronize_snapshot(&s, snapshot(&[("A", "https://a.example", &["A1"])]))
    .await
    .unwrap();

  assert_eq!(s.count_labs().await.unwrap(), 3);

  let per_lab = s.count_topics_grouped_by_lab().await.unwrap();
  assert_eq!(per_lab.len(), 2);
  assert_eq!(per_lab["A"], 2);
  assert_eq!(per_lab["B"], 1);

  let listing = s.list_labs_with_topics().await.unwrap();
  let names: Vec<&str> = listing.iter().map(|l| l.lab_name.as_str()).collect();
  assert_eq!(names, ["Empty", "A", "B"]);
  assert!(listing[0].topics.is_empty());
  assert_eq!(listing[1].topics[0].title, "A1");
  assert_eq!(listing[1].topics[1].status, TopicStatus::Closed);
  // B was not scraped in the second cycle, so its topic stays open.
  assert_eq!(listing[2].topics[0].status, TopicStatus::Open);
}

#[tokio::test]
async fn state_survives_reopen_on_disk() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("topics.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    synchronize_snapshot(&s, snapshot(&[("L", "https://l.example", &["T1"])]))
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let topics = s.list_topics().await.unwrap();
  assert_eq!(topics.len(), 1);
  assert_eq!(topics[0].title, "T1");
}
