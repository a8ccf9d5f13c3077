//! Error types for the lineage library.
//!
//! Every failure is fatal to the call that produced it: nothing here is
//! retried or recovered locally, the orchestrating pipeline decides what to do.

use thiserror::Error;

/// The main error type for lineage operations.
#[derive(Debug, Error)]
pub enum LineageError {
    /// Lineage state was used out of order.
    #[error("{0}")]
    State(#[from] StateError),

    /// An identity was referenced that is not tracked.
    #[error("Unknown artifact: '{0}'")]
    UnknownArtifact(String),

    /// The ancestor relation contains a cycle.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// A documentation record is malformed.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// The provenance document rejected an operation.
    #[error("{0}")]
    Document(#[from] DocumentError),

    /// Writing or rendering an export failed.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LineageError {
    /// Returns a stable diagnostic code for the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::State(_) => "LINEAGE-STATE",
            Self::UnknownArtifact(_) => "LINEAGE-UNKNOWN",
            Self::CycleDetected(_) => "LINEAGE-CYCLE",
            Self::Schema(_) => "LINEAGE-SCHEMA",
            Self::Document(_) => "LINEAGE-DOCUMENT",
            Self::Export(_) => "LINEAGE-EXPORT",
            Self::Config(_) => "LINEAGE-CONFIG",
            Self::Io(_) => "LINEAGE-IO",
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = LineageError> = std::result::Result<T, E>;

/// Lineage operations invoked in the wrong state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// `initialize_lineage` was called on an artifact that already has a document.
    #[error("Provenance of {identity} already initialized")]
    AlreadyInitialized {
        /// The artifact identity.
        identity: String,
    },

    /// The artifact has no document yet.
    #[error("Provenance of {identity} not initialized")]
    NotInitialized {
        /// The artifact identity.
        identity: String,
    },

    /// A derivation was asserted before the artifact's activity existed.
    #[error("Activity not initialized for {identity}")]
    ActivityMissing {
        /// The artifact identity.
        identity: String,
    },

    /// An artifact with the same identity is already tracked.
    #[error("Artifact {identity} is already tracked")]
    DuplicateArtifact {
        /// The artifact identity.
        identity: String,
    },

    /// The ancestors supplied do not match the ones the artifact declares.
    #[error("Ancestors of {identity} are {declared:?}, got {supplied:?}")]
    AncestorMismatch {
        /// The artifact identity.
        identity: String,
        /// Ancestor identities declared on the artifact.
        declared: Vec<String>,
        /// Ancestor identities supplied to the call.
        supplied: Vec<String>,
    },
}

impl StateError {
    /// Creates an already-initialized error.
    #[must_use]
    pub fn already_initialized(identity: impl Into<String>) -> Self {
        Self::AlreadyInitialized {
            identity: identity.into(),
        }
    }

    /// Creates a not-initialized error.
    #[must_use]
    pub fn not_initialized(identity: impl Into<String>) -> Self {
        Self::NotInitialized {
            identity: identity.into(),
        }
    }

    /// Creates an activity-missing error.
    #[must_use]
    pub fn activity_missing(identity: impl Into<String>) -> Self {
        Self::ActivityMissing {
            identity: identity.into(),
        }
    }

    /// Creates a duplicate-artifact error.
    #[must_use]
    pub fn duplicate(identity: impl Into<String>) -> Self {
        Self::DuplicateArtifact {
            identity: identity.into(),
        }
    }

    /// Creates an ancestor-mismatch error.
    #[must_use]
    pub fn ancestor_mismatch(
        identity: impl Into<String>,
        declared: Vec<String>,
        supplied: Vec<String>,
    ) -> Self {
        Self::AncestorMismatch {
            identity: identity.into(),
            declared,
            supplied,
        }
    }
}

/// Error raised when the ancestor relation contains a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cycle detected in ancestry: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The identities forming the cycle, first element repeated at the end.
    pub cycle_path: Vec<String>,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        Self { cycle_path }
    }
}

/// Error raised when a documentation record is missing a key or has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid documentation record: {message}")]
pub struct SchemaError {
    /// The offending key, when known.
    pub key: Option<String>,
    /// Description of the problem.
    pub message: String,
}

impl SchemaError {
    /// Creates a new schema error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            key: None,
            message: message.into(),
        }
    }

    /// Creates a missing-key error.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("missing field `{key}`"),
            key: Some(key),
        }
    }
}

/// Errors raised by a provenance document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A prefix was declared twice with different URIs.
    #[error("Namespace '{prefix}' is bound to {existing}, cannot rebind to {requested}")]
    NamespaceConflict {
        /// The namespace prefix.
        prefix: String,
        /// The URI already bound.
        existing: String,
        /// The URI that was requested.
        requested: String,
    },

    /// A qualified name used a prefix that was never declared.
    #[error("Namespace '{prefix}' is not declared")]
    UndeclaredNamespace {
        /// The namespace prefix.
        prefix: String,
    },

    /// A qualified name could not be parsed.
    #[error("Invalid qualified name '{0}'")]
    InvalidQualifiedName(String),

    /// A relation referenced a record absent from the document.
    #[error("Unknown {kind} '{id}'")]
    UnknownRecord {
        /// The record kind (entity, activity, agent).
        kind: &'static str,
        /// The qualified id.
        id: String,
    },
}

/// Errors raised while exporting a document.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The graph renderer is not available or failed.
    #[error("Graph rendering failed ({format}): {reason}")]
    Render {
        /// Requested output format.
        format: String,
        /// Failure detail.
        reason: String,
    },

    /// The document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A staged file could not be published.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Creates a render error.
    #[must_use]
    pub fn render(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Creates a write error.
    #[must_use]
    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
