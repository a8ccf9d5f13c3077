//! Testing utilities for lineage consumers.
//!
//! This module provides:
//! - Recording doubles for the document and renderer seams
//! - Fixtures for common graph shapes and documentation records

mod fixtures;
mod mocks;

pub use fixtures::{attributes, diamond_graph, sample_documentation};
pub use mocks::{DocumentCall, FailingRenderer, RecordingDocument, RecordingRenderer};
