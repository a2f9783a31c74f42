//! Error type for `thesis-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] thesis_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("topic not found: {0}")]
  TopicNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
