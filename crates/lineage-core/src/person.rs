//! Ancestry-tree wire model — the `persons` array of a tree fetch.

use serde::Deserialize;

use crate::error::{Error, Result};

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
struct DisplayProperties {
  name:     Option<String>,
  lifespan: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PersonLink {
  href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PersonLinks {
  #[serde(default)]
  person: Option<PersonLink>,
}

#[derive(Debug, Clone, Deserialize)]
struct PersonEntry {
  #[serde(default)]
  display: Option<DisplayProperties>,
  #[serde(default)]
  links:   Option<PersonLinks>,
}

#[derive(Debug, Clone, Deserialize)]
struct TreeBody {
  #[serde(default)]
  persons: Vec<PersonEntry>,
}

// ─── Parsed record ───────────────────────────────────────────────────────────

/// One ancestor row. Immutable after parsing; a reload replaces the whole
/// list at once, never merging into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorRecord {
  pub display_name: String,
  pub lifespan:     String,
  /// Portrait URL for the row, when the service provides one.
  pub image_link_href: Option<String>,
}

/// Parse a tree-fetch response body into ancestor records.
///
/// `display.name` and `display.lifespan` are required on every entry; a
/// single missing field fails the whole parse so the caller never renders
/// a partial tree. `links.person.href` is optional and becomes the portrait
/// link. Document order is preserved.
pub fn parse_ancestry_tree(body: &[u8]) -> Result<Vec<AncestorRecord>> {
  let tree: TreeBody = serde_json::from_slice(body)?;
  tree
    .persons
    .into_iter()
    .enumerate()
    .map(|(index, entry)| {
      let display = entry.display.unwrap_or_default();
      let display_name = display.name.ok_or(Error::MissingField {
        index,
        field: "display.name",
      })?;
      let lifespan = display.lifespan.ok_or(Error::MissingField {
        index,
        field: "display.lifespan",
      })?;
      let image_link_href = entry
        .links
        .and_then(|links| links.person)
        .and_then(|person| person.href);
      Ok(AncestorRecord {
        display_name,
        lifespan,
        image_link_href,
      })
    })
    .collect()
}
