//! The gateway trait — network operations the pipeline and UI depend on.

use bytes::Bytes;
use lineage_core::{
  document::{QueryTemplate, ServiceDocument},
  person::AncestorRecord,
};

use crate::error::Result;

/// Network operations against the genealogy service.
///
/// Implemented by [`HttpGateway`](crate::http::HttpGateway) for real use
/// and by in-memory stubs in tests.
pub trait AncestryGateway {
  /// GET the discovery root and parse the service document.
  async fn fetch_service_document(&self) -> Result<ServiceDocument>;

  /// GET `<template>?person=<id>&generations=<n>` and parse the persons.
  async fn fetch_ancestry_tree(
    &self,
    template: &QueryTemplate,
    person_id: &str,
    generations: u32,
  ) -> Result<Vec<AncestorRecord>>;

  /// GET a portrait image, returning the raw bytes.
  async fn fetch_image(&self, href: &str) -> Result<Bytes>;
}
