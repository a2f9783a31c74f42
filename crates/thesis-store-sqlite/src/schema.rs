//! SQL schema for the thesis SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Labs are never updated once inserted.
CREATE TABLE IF NOT EXISTS labs (
    lab_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    lab_name  TEXT NOT NULL UNIQUE,
    lab_url   TEXT NOT NULL UNIQUE
);

-- Topics are never deleted; only `status` changes.
CREATE TABLE IF NOT EXISTS thesis_topics (
    topic_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    url         TEXT NOT NULL,
    added_date  TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    status      TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'closed')),
    lab_id      INTEGER NOT NULL REFERENCES labs(lab_id),
    UNIQUE (title, lab_id)
);

CREATE INDEX IF NOT EXISTS thesis_topics_lab_idx    ON thesis_topics(lab_id);
CREATE INDEX IF NOT EXISTS thesis_topics_status_idx ON thesis_topics(status);

PRAGMA user_version = 1;
";
