//! Sequential discovery → tree-fetch orchestration.
//!
//! The pipeline walks a fixed sequence of states; no step begins until
//! the previous one succeeded, and the first failure halts the run with
//! no internal retry. Each reload is tagged with a generation so
//! completions that started under an older reload can be discarded.

use lineage_core::{
  document::{QueryTemplate, resolve_ancestry_template},
  person::AncestorRecord,
};

use crate::{
  error::{Error, Result},
  gateway::AncestryGateway,
};

/// Monotonic token identifying one reload. Work spawned under an older
/// generation is stale once a newer reload begins.
pub type Generation = u64;

/// Where the pipeline currently is within a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
  Idle,
  Discovering,
  TemplateResolved(QueryTemplate),
  FetchingTree,
  TreeReady(Vec<AncestorRecord>),
  Failed(String),
}

/// Drives discovery and tree fetch over any [`AncestryGateway`].
pub struct Pipeline<G> {
  gateway:    G,
  state:      PipelineState,
  generation: Generation,
}

impl<G: AncestryGateway> Pipeline<G> {
  pub fn new(gateway: G) -> Self {
    Self {
      gateway,
      state: PipelineState::Idle,
      generation: 0,
    }
  }

  pub fn state(&self) -> &PipelineState {
    &self.state
  }

  /// Generation of the most recent reload.
  pub fn generation(&self) -> Generation {
    self.generation
  }

  pub fn gateway(&self) -> &G {
    &self.gateway
  }

  /// Run the full discovery → tree-fetch sequence.
  ///
  /// Returns the generation of this reload together with the fetched
  /// records; the caller replaces its whole list at once. On the first
  /// failure the pipeline enters [`PipelineState::Failed`] and the
  /// remaining steps are never issued. Dropping the returned future
  /// cancels whichever request was in flight.
  pub async fn reload(
    &mut self,
    person_id: &str,
    generations: u32,
  ) -> Result<(Generation, Vec<AncestorRecord>)> {
    self.generation += 1;
    let generation = self.generation;

    self.state = PipelineState::Discovering;
    let doc = match self.gateway.fetch_service_document().await {
      Ok(doc) => doc,
      Err(e) => return Err(self.fail(e)),
    };
    let template = match resolve_ancestry_template(&doc) {
      Ok(template) => template,
      Err(e) => return Err(self.fail(e.into())),
    };
    tracing::info!(template = %template, "resolved ancestry template");
    self.state = PipelineState::TemplateResolved(template.clone());

    self.state = PipelineState::FetchingTree;
    let records = match self
      .gateway
      .fetch_ancestry_tree(&template, person_id, generations)
      .await
    {
      Ok(records) => records,
      Err(e) => return Err(self.fail(e)),
    };
    tracing::info!(count = records.len(), "ancestry tree ready");
    self.state = PipelineState::TreeReady(records.clone());
    Ok((generation, records))
  }

  fn fail(&mut self, e: Error) -> Error {
    self.state = PipelineState::Failed(e.to_string());
    e
  }
}
