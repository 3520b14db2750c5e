//! HTTP gateway and pipeline orchestration for the lineage browser.
//!
//! [`AncestryGateway`] is the seam between the network and everything
//! above it; [`HttpGateway`] is the reqwest implementation and
//! [`Pipeline`] drives the discovery → tree-fetch sequence over any
//! gateway.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod gateway;
pub mod http;
pub mod pipeline;

pub use error::{Error, Result};
pub use gateway::AncestryGateway;
pub use http::{ClientConfig, HttpGateway};
pub use pipeline::{Generation, Pipeline, PipelineState};
