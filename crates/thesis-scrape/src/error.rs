//! Error type for source adapters and page fetching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned status {status}")]
  Status { url: String, status: u16 },

  #[error("invalid url {url:?}: {reason}")]
  Url { url: String, reason: String },

  #[error("parse error: {0}")]
  Parse(String),
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
