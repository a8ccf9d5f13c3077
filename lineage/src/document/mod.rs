//! Provenance documents.
//!
//! [`ProvenanceDocument`] is the seam between lineage construction and the
//! graph model: the tracker and the recipe builder only ever talk to the
//! trait, so a recording double can stand in for [`ProvDocument`] in tests.

mod dot;
mod json;
mod model;
mod qualified;
mod xml;

pub use model::{Attribution, Derivation, ProvDocument};
pub use qualified::QualifiedName;

use crate::errors::{DocumentError, ExportError};
use crate::namespace::{Namespace, Namespaces};
use indexmap::IndexMap;
use std::fmt;

/// Attribute map of a record, keyed by qualified attribute name.
pub type Attributes = IndexMap<QualifiedName, String>;

/// Handle to an entity inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef(QualifiedName);

/// Handle to an activity inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityRef(QualifiedName);

/// Handle to an agent inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentRef(QualifiedName);

macro_rules! record_ref {
    ($name:ident) => {
        impl $name {
            /// Wraps a qualified name.
            #[must_use]
            pub fn new(id: QualifiedName) -> Self {
                Self(id)
            }

            /// Returns the qualified id.
            #[must_use]
            pub fn id(&self) -> &QualifiedName {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

record_ref!(EntityRef);
record_ref!(ActivityRef);
record_ref!(AgentRef);

/// Operations lineage construction needs from a provenance graph document.
pub trait ProvenanceDocument: Default + fmt::Debug {
    /// Declares a namespace. Redeclaring the same binding is a no-op.
    fn add_namespace(&mut self, namespace: &Namespace) -> Result<(), DocumentError>;

    /// Declares every namespace of a registry.
    fn declare_namespaces(&mut self, namespaces: &Namespaces) -> Result<(), DocumentError> {
        for ns in namespaces.iter() {
            self.add_namespace(ns)?;
        }
        Ok(())
    }

    /// Creates (or extends) an entity.
    fn entity(&mut self, id: QualifiedName, attributes: Attributes)
        -> Result<EntityRef, DocumentError>;

    /// Creates an activity.
    fn activity(&mut self, id: QualifiedName) -> Result<ActivityRef, DocumentError>;

    /// Creates (or extends) an agent.
    fn agent(&mut self, id: QualifiedName, attributes: Attributes)
        -> Result<AgentRef, DocumentError>;

    /// Asserts that `generated` was derived from `used` by `activity`.
    fn was_derived_from(
        &mut self,
        generated: &EntityRef,
        used: &EntityRef,
        activity: &ActivityRef,
    ) -> Result<(), DocumentError>;

    /// Asserts that `entity` is attributed to `agent`.
    fn was_attributed_to(&mut self, entity: &EntityRef, agent: &AgentRef)
        -> Result<(), DocumentError>;

    /// Folds every namespace, record and relation of `other` into `self`.
    fn update(&mut self, other: &Self) -> Result<(), DocumentError>;

    /// Serializes to PROV-XML.
    fn to_prov_xml(&self) -> Result<String, ExportError>;

    /// Serializes to PROV-JSON.
    fn to_prov_json(&self) -> serde_json::Value;

    /// Renders the document as Graphviz DOT source.
    fn to_dot(&self) -> String;
}

/// Formats a metadata value for use as an attribute string.
///
/// Strings are taken verbatim, everything else in its JSON text form.
#[must_use]
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
