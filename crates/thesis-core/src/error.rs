//! Error types for `thesis-core`.

use thiserror::Error;

use crate::topic::TopicId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unique constraint violated: {0}")]
  UniqueViolation(String),

  #[error("topic not found: {0}")]
  TopicNotFound(TopicId),

  #[error("lab not found: {0}")]
  LabNotFound(i64),

  #[error("unknown topic status: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
