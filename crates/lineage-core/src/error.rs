//! Error types for `lineage-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("service document has no collections")]
  NoCollections,

  #[error("first collection has no ancestry-query template")]
  MissingAncestryQuery,

  #[error("ancestry-query template has an empty literal prefix")]
  EmptyTemplate,

  #[error("person entry {index} is missing required field {field}")]
  MissingField { index: usize, field: &'static str },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
