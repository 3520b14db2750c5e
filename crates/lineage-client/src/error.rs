//! Error types for `lineage-client`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport-level failure: connect, timeout, reading the body.
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET {url} → {status}")]
  Status { url: String, status: StatusCode },

  #[error("parse error: {0}")]
  Parse(#[from] lineage_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Whether this failure happened on the wire rather than in parsing.
  pub fn is_network(&self) -> bool {
    matches!(self, Error::Http(_) | Error::Status { .. })
  }
}
