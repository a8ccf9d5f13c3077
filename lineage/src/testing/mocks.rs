//! Recording doubles for the document and renderer seams.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::document::{
    ActivityRef, AgentRef, Attributes, EntityRef, ProvenanceDocument, QualifiedName,
};
use crate::errors::{DocumentError, ExportError};
use crate::export::{ExportFormat, GraphRenderer};
use crate::namespace::Namespace;

/// One call made against a [`RecordingDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentCall {
    /// `add_namespace`.
    Namespace {
        /// Prefix.
        prefix: String,
        /// URI.
        uri: String,
    },
    /// `entity`.
    Entity {
        /// Qualified id.
        id: String,
        /// Attributes as `(key, value)` strings.
        attributes: Vec<(String, String)>,
    },
    /// `activity`.
    Activity {
        /// Qualified id.
        id: String,
    },
    /// `agent`.
    Agent {
        /// Qualified id.
        id: String,
        /// Attributes as `(key, value)` strings.
        attributes: Vec<(String, String)>,
    },
    /// `was_derived_from`.
    Derivation {
        /// Derived entity.
        generated: String,
        /// Source entity.
        used: String,
        /// Activity.
        activity: String,
    },
    /// `was_attributed_to`.
    Attribution {
        /// Entity.
        entity: String,
        /// Agent.
        agent: String,
    },
    /// `update`, with the number of calls recorded by the merged document.
    Update {
        /// Calls in the merged document.
        merged_calls: usize,
    },
}

impl DocumentCall {
    /// Short name of the call.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Namespace { .. } => "namespace",
            Self::Entity { .. } => "entity",
            Self::Activity { .. } => "activity",
            Self::Agent { .. } => "agent",
            Self::Derivation { .. } => "derivation",
            Self::Attribution { .. } => "attribution",
            Self::Update { .. } => "update",
        }
    }
}

fn pairs(attributes: &Attributes) -> Vec<(String, String)> {
    attributes
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A document that records every call instead of building a graph.
#[derive(Debug, Clone, Default)]
pub struct RecordingDocument {
    calls: Vec<DocumentCall>,
}

impl RecordingDocument {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> &[DocumentCall] {
        &self.calls
    }

    /// Calls of one kind.
    #[must_use]
    pub fn calls_of(&self, kind: &str) -> Vec<&DocumentCall> {
        self.calls.iter().filter(|c| c.kind() == kind).collect()
    }
}

impl ProvenanceDocument for RecordingDocument {
    fn add_namespace(&mut self, namespace: &Namespace) -> Result<(), DocumentError> {
        self.calls.push(DocumentCall::Namespace {
            prefix: namespace.prefix.clone(),
            uri: namespace.uri.clone(),
        });
        Ok(())
    }

    fn entity(
        &mut self,
        id: QualifiedName,
        attributes: Attributes,
    ) -> Result<EntityRef, DocumentError> {
        self.calls.push(DocumentCall::Entity {
            id: id.to_string(),
            attributes: pairs(&attributes),
        });
        Ok(EntityRef::new(id))
    }

    fn activity(&mut self, id: QualifiedName) -> Result<ActivityRef, DocumentError> {
        self.calls.push(DocumentCall::Activity { id: id.to_string() });
        Ok(ActivityRef::new(id))
    }

    fn agent(
        &mut self,
        id: QualifiedName,
        attributes: Attributes,
    ) -> Result<AgentRef, DocumentError> {
        self.calls.push(DocumentCall::Agent {
            id: id.to_string(),
            attributes: pairs(&attributes),
        });
        Ok(AgentRef::new(id))
    }

    fn was_derived_from(
        &mut self,
        generated: &EntityRef,
        used: &EntityRef,
        activity: &ActivityRef,
    ) -> Result<(), DocumentError> {
        self.calls.push(DocumentCall::Derivation {
            generated: generated.to_string(),
            used: used.to_string(),
            activity: activity.to_string(),
        });
        Ok(())
    }

    fn was_attributed_to(
        &mut self,
        entity: &EntityRef,
        agent: &AgentRef,
    ) -> Result<(), DocumentError> {
        self.calls.push(DocumentCall::Attribution {
            entity: entity.to_string(),
            agent: agent.to_string(),
        });
        Ok(())
    }

    fn update(&mut self, other: &Self) -> Result<(), DocumentError> {
        self.calls.push(DocumentCall::Update {
            merged_calls: other.calls.len(),
        });
        Ok(())
    }

    fn to_prov_xml(&self) -> Result<String, ExportError> {
        Ok(format!("<recording calls=\"{}\"/>", self.calls.len()))
    }

    fn to_prov_json(&self) -> serde_json::Value {
        serde_json::json!({ "calls": self.calls.len() })
    }

    fn to_dot(&self) -> String {
        format!("digraph recording {{ /* {} calls */ }}\n", self.calls.len())
    }
}

/// A renderer that records its inputs and returns the format name as bytes.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    renders: Arc<Mutex<Vec<(ExportFormat, String)>>>,
}

impl RecordingRenderer {
    /// Creates a new recording renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats requested so far, in order.
    #[must_use]
    pub fn formats(&self) -> Vec<ExportFormat> {
        self.renders.lock().iter().map(|(f, _)| *f).collect()
    }

    /// DOT sources received so far, in order.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.renders.lock().iter().map(|(_, s)| s.clone()).collect()
    }
}

impl GraphRenderer for RecordingRenderer {
    fn render(&self, dot: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        self.renders.lock().push((format, dot.to_string()));
        Ok(format.extension().as_bytes().to_vec())
    }
}

/// A renderer that fails for one format.
#[derive(Debug, Clone)]
pub struct FailingRenderer {
    format: ExportFormat,
    reason: String,
}

impl FailingRenderer {
    /// Creates a renderer failing whenever `format` is requested.
    #[must_use]
    pub fn new(format: ExportFormat, reason: impl Into<String>) -> Self {
        Self {
            format,
            reason: reason.into(),
        }
    }
}

impl GraphRenderer for FailingRenderer {
    fn render(&self, _dot: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        if format == self.format {
            Err(ExportError::render(format.extension(), self.reason.clone()))
        } else {
            Ok(format.extension().as_bytes().to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_renderer_shares_state() {
        let renderer = RecordingRenderer::new();
        let handle = renderer.clone();
        renderer.render("digraph {}", ExportFormat::Svg).unwrap();

        assert_eq!(handle.formats(), vec![ExportFormat::Svg]);
        assert_eq!(handle.sources(), vec!["digraph {}".to_string()]);
    }

    #[test]
    fn test_failing_renderer_only_fails_its_format() {
        let renderer = FailingRenderer::new(ExportFormat::Png, "boom");
        assert!(renderer.render("", ExportFormat::Pdf).is_ok());
        assert!(renderer.render("", ExportFormat::Png).is_err());
    }
}
