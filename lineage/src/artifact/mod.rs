//! Tracked artifacts and the lineage graph they form.
//!
//! - [`TrackedArtifact`]: one output file, its attributes and its document
//! - [`LineageGraph`]: the run's artifacts, keyed by identity, with
//!   on-demand initialization of ancestor documents
//! - [`TaskDescriptor`]: the processing step credited with an artifact

mod graph;
#[cfg(test)]
mod integration_tests;
mod task;
mod tracked;

pub use graph::{DerivationSource, LineageGraph};
pub use task::{Task, TaskDescriptor};
pub use tracked::TrackedArtifact;
