//! Discovery wire model — the service root document and its link templates.
//!
//! The discovery response lists collections, each carrying a map of named
//! link relations: `collections[].links.<relation>`. The only relation this
//! crate consumes is `ancestry-query`, whose URI template is truncated to
//! its literal prefix before query parameters are appended.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Relation name of the ancestry query link within a collection.
pub const ANCESTRY_QUERY_REL: &str = "ancestry-query";

/// One link relation inside a collection. Templated links carry a URI
/// template such as `https://api.example.org/tree/ancestry{?person}`;
/// plain links carry an `href`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
  #[serde(default)]
  pub template: Option<String>,
  #[serde(default)]
  pub href:     Option<String>,
}

/// One entry of the service document's `collections` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Collection {
  #[serde(default)]
  pub links: HashMap<String, Link>,
}

/// Parsed discovery response.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDocument {
  #[serde(default)]
  pub collections: Vec<Collection>,
}

/// The literal prefix of an ancestry-query URI template, ready to take
/// `person` and `generations` query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate(String);

impl QueryTemplate {
  /// Derive the literal prefix of `template`: everything before the first
  /// `{`, or the whole string when no placeholder is present.
  pub fn from_template(template: &str) -> Result<Self> {
    let prefix = match template.find('{') {
      Some(i) => &template[..i],
      None => template,
    };
    if prefix.is_empty() {
      return Err(Error::EmptyTemplate);
    }
    Ok(Self(prefix.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for QueryTemplate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Parse a discovery response body.
pub fn parse_service_document(body: &[u8]) -> Result<ServiceDocument> {
  Ok(serde_json::from_slice(body)?)
}

/// Extract the ancestry-query template prefix from a service document.
///
/// Only the first collection is consulted, matching how the upstream
/// service lays out its root document. Fragile if the service ever
/// reorders collections; switch to relation-based selection across all
/// collections if that happens.
pub fn resolve_ancestry_template(doc: &ServiceDocument) -> Result<QueryTemplate> {
  let collection = doc.collections.first().ok_or(Error::NoCollections)?;
  let template = collection
    .links
    .get(ANCESTRY_QUERY_REL)
    .and_then(|link| link.template.as_deref())
    .ok_or(Error::MissingAncestryQuery)?;
  QueryTemplate::from_template(template)
}
