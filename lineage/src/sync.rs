//! A lineage graph shared between worker threads.
//!
//! Tasks of a run may finish on different threads; each registers its
//! outputs and initializes their lineage through a cloned handle. All
//! operations serialize on one lock, so recursive ancestor initialization
//! never observes a half-built graph.

use crate::artifact::{DerivationSource, LineageGraph, TaskDescriptor, TrackedArtifact};
use crate::config::LineageConfig;
use crate::document::{ProvDocument, ProvenanceDocument};
use crate::errors::Result;
use crate::export::Exporter;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a [`LineageGraph`] behind a mutex.
#[derive(Debug)]
pub struct SharedLineageGraph<D = ProvDocument> {
    inner: Arc<Mutex<LineageGraph<D>>>,
}

impl<D> Clone for SharedLineageGraph<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedLineageGraph<ProvDocument> {
    /// Creates an empty shared graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_graph(LineageGraph::new())
    }
}

impl Default for SharedLineageGraph<ProvDocument> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ProvenanceDocument> SharedLineageGraph<D> {
    /// Wraps an existing graph.
    #[must_use]
    pub fn from_graph(graph: LineageGraph<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Creates an empty shared graph using `config.base_uri`.
    #[must_use]
    pub fn with_config(config: &LineageConfig) -> Self {
        Self::from_graph(LineageGraph::with_config(config))
    }

    /// See [`LineageGraph::track`].
    pub fn track(&self, artifact: TrackedArtifact<D>) -> Result<()> {
        self.inner.lock().track(artifact)
    }

    /// See [`LineageGraph::initialize_lineage`].
    pub fn initialize_lineage<T>(&self, identity: &str, task: &T) -> Result<()>
    where
        T: TaskDescriptor + ?Sized,
    {
        self.inner.lock().initialize_lineage(identity, task)
    }

    /// See [`LineageGraph::assert_derived_from`].
    pub fn assert_derived_from(
        &self,
        identity: &str,
        source: impl Into<DerivationSource>,
    ) -> Result<()> {
        self.inner.lock().assert_derived_from(identity, source)
    }

    /// See [`LineageGraph::export_lineage`].
    ///
    /// The lock is held while files are written.
    pub fn export_lineage(&self, identity: &str, exporter: &Exporter) -> Result<()> {
        self.inner.lock().export_lineage(identity, exporter)
    }

    /// Runs `f` with the graph locked.
    pub fn with<R>(&self, f: impl FnOnce(&LineageGraph<D>) -> R) -> R {
        f(&*self.inner.lock())
    }

    /// Runs `f` with the graph locked for mutation.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut LineageGraph<D>) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}
