//! A single output file and its provenance document.

use super::TaskDescriptor;
use crate::document::{
    display_value, ActivityRef, Attributes, EntityRef, ProvDocument, ProvenanceDocument,
    QualifiedName,
};
use crate::errors::{DocumentError, Result, StateError};
use crate::export::{artifact_base, Exporter};
use crate::namespace::{Namespaces, ATTRIBUTE, FILE, TASK};
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// An initialized document together with the handles of its own records.
#[derive(Debug, Clone)]
pub(crate) struct Lineage<D> {
    pub(crate) document: D,
    pub(crate) node: EntityRef,
    pub(crate) activity: ActivityRef,
}

/// An output file tracked for provenance.
///
/// Equality and hashing use the identity alone: two artifacts naming the same
/// file are the same artifact to a set or map, whatever their attributes or
/// ancestors. Use [`TrackedArtifact::structurally_eq`] to compare content.
#[derive(Debug, Clone)]
pub struct TrackedArtifact<D = ProvDocument> {
    identity: String,
    attributes: IndexMap<String, serde_json::Value>,
    ancestors: Vec<String>,
    document: Option<D>,
    node: Option<EntityRef>,
    activity: Option<ActivityRef>,
}

impl<D: ProvenanceDocument> TrackedArtifact<D> {
    /// Creates an artifact with no ancestors and no provenance yet.
    #[must_use]
    pub fn new(
        identity: impl Into<String>,
        attributes: IndexMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            identity: identity.into(),
            attributes,
            ancestors: Vec::new(),
            document: None,
            node: None,
            activity: None,
        }
    }

    /// Sets the identities this artifact was derived from, in order.
    #[must_use]
    pub fn with_ancestors<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    /// The file path or output identifier.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Descriptive metadata, in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Identities of the artifacts this one was derived from.
    #[must_use]
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// The provenance document, once initialized.
    #[must_use]
    pub fn document(&self) -> Option<&D> {
        self.document.as_ref()
    }

    /// This artifact's entity handle, once initialized.
    #[must_use]
    pub fn entity(&self) -> Option<&EntityRef> {
        self.node.as_ref()
    }

    /// The activity that produced this artifact, once initialized.
    #[must_use]
    pub fn activity(&self) -> Option<&ActivityRef> {
        self.activity.as_ref()
    }

    /// Returns true once lineage has been initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.document.is_some()
    }

    /// Compares identity, attributes, ancestors and initialization state.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.attributes == other.attributes
            && self.ancestors == other.ancestors
            && self.is_initialized() == other.is_initialized()
    }

    /// Initializes lineage against ancestors that are already initialized.
    ///
    /// `ancestors` must be the artifacts named by [`TrackedArtifact::ancestors`],
    /// in the same order; anything else is a state error. Use [`crate::artifact::LineageGraph`] to have
    /// uninitialized ancestors initialized on the way.
    pub fn initialize_lineage<T>(
        &mut self,
        task: &T,
        namespaces: &Namespaces,
        ancestors: &[&Self],
    ) -> Result<()>
    where
        T: TaskDescriptor + ?Sized,
    {
        let matches = ancestors.len() == self.ancestors.len()
            && ancestors
                .iter()
                .zip(&self.ancestors)
                .all(|(given, declared)| given.identity == *declared);
        if !matches {
            return Err(StateError::ancestor_mismatch(
                &self.identity,
                self.ancestors.clone(),
                ancestors.iter().map(|a| a.identity.clone()).collect(),
            )
            .into());
        }

        let views = ancestors
            .iter()
            .map(|a| match (a.document.as_ref(), a.node.as_ref()) {
                (Some(document), Some(node)) => Ok((document, node)),
                _ => Err(StateError::not_initialized(&a.identity)),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let lineage = self.build_lineage(task, namespaces, &views)?;
        self.install(lineage);
        Ok(())
    }

    /// Builds this artifact's document without touching `self`.
    ///
    /// Each ancestor view is the ancestor's full document and its entity.
    pub(crate) fn build_lineage<T>(
        &self,
        task: &T,
        namespaces: &Namespaces,
        ancestors: &[(&D, &EntityRef)],
    ) -> Result<Lineage<D>>
    where
        T: TaskDescriptor + ?Sized,
    {
        if self.is_initialized() {
            return Err(StateError::already_initialized(&self.identity).into());
        }

        let mut document = D::default();
        document.declare_namespaces(namespaces)?;

        let activity = document.activity(QualifiedName::new(TASK, task.name())?)?;

        let attributes = self
            .attributes
            .iter()
            .map(|(key, value)| -> std::result::Result<_, DocumentError> {
                Ok((QualifiedName::new(ATTRIBUTE, key.as_str())?, display_value(value)))
            })
            .collect::<std::result::Result<Attributes, _>>()?;
        let node = document.entity(QualifiedName::new(FILE, self.identity.as_str())?, attributes)?;

        for (ancestor_document, ancestor_node) in ancestors {
            document.update(ancestor_document)?;
            document.was_derived_from(&node, ancestor_node, &activity)?;
        }

        debug!(
            artifact = %self.identity,
            task = task.name(),
            ancestors = ancestors.len(),
            "Built provenance"
        );

        Ok(Lineage {
            document,
            node,
            activity,
        })
    }

    pub(crate) fn install(&mut self, lineage: Lineage<D>) {
        self.document = Some(lineage.document);
        self.node = Some(lineage.node);
        self.activity = Some(lineage.activity);
    }

    /// Asserts that this artifact was derived from `entity` by its own activity.
    pub fn was_derived_from(&mut self, entity: &EntityRef) -> Result<()> {
        let (Some(activity), Some(node), Some(document)) =
            (self.activity.as_ref(), self.node.as_ref(), self.document.as_mut())
        else {
            return Err(StateError::activity_missing(&self.identity).into());
        };
        document.was_derived_from(node, entity, activity)?;
        Ok(())
    }

    /// Writes `<stem>_provenance.{xml,png}` next to the artifact.
    pub fn export_lineage(&self, exporter: &Exporter) -> Result<()> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| StateError::not_initialized(&self.identity))?;
        let base = artifact_base(&self.identity, &exporter.config().artifact_suffix);
        exporter.export_with_base(document, &base, &exporter.config().artifact_formats)?;
        Ok(())
    }
}

impl<D> PartialEq for TrackedArtifact<D> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl<D> Eq for TrackedArtifact<D> {}

impl<D> Hash for TrackedArtifact<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}
