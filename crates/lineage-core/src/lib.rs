//! Core types for the lineage ancestry browser.
//!
//! This crate is deliberately free of HTTP dependencies. It holds the wire
//! models for the genealogy service, the query-template derivation, and the
//! bounded portrait cache; everything here is pure and unit-testable.

pub mod cache;
pub mod document;
pub mod error;
pub mod person;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
