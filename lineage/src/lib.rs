//! # Lineage
//!
//! Provenance tracking for the outputs of a scientific processing pipeline.
//!
//! Every output file becomes a [`TrackedArtifact`](artifact::TrackedArtifact)
//! carrying a W3C PROV document that records:
//!
//! - **What it is**: an entity with the file's metadata as attributes
//! - **How it was made**: the task activity that produced it
//! - **Where it came from**: derivation edges to every ancestor, with the
//!   ancestors' own documents folded in
//!
//! A separate recipe document credits the run's authors. Documents are
//! exported as PROV-XML plus rendered Graphviz images.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lineage::prelude::*;
//!
//! let mut graph = LineageGraph::new();
//! graph.track(TrackedArtifact::new("work/tas.nc", attrs))?;
//! graph.track(TrackedArtifact::new("work/tas_mean.nc", attrs).with_ancestors(["work/tas.nc"]))?;
//!
//! // Initializes work/tas.nc on the way.
//! graph.initialize_lineage("work/tas_mean.nc", &Task::new("diagnostic/mean"))?;
//! graph.export_lineage("work/tas_mean.nc", &Exporter::new(LineageConfig::default()))?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifact;
pub mod config;
pub mod document;
pub mod errors;
pub mod export;
pub mod namespace;
pub mod recipe;
pub mod sync;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifact::{
        DerivationSource, LineageGraph, Task, TaskDescriptor, TrackedArtifact,
    };
    pub use crate::config::LineageConfig;
    pub use crate::document::{
        EntityRef, ProvDocument, ProvenanceDocument, QualifiedName,
    };
    pub use crate::errors::{LineageError, Result};
    pub use crate::export::{ExportFormat, Exporter, GraphRenderer, GraphvizRenderer};
    pub use crate::namespace::Namespaces;
    pub use crate::recipe::{
        build_recipe_provenance, Author, RecipeDocumentation,
    };
    pub use crate::sync::SharedLineageGraph;
}
