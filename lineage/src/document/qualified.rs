//! Prefixed identifiers.

use crate::errors::DocumentError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An identifier qualified by a namespace prefix, written `prefix:local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    prefix: String,
    local: String,
}

impl QualifiedName {
    /// Creates a qualified name, rejecting malformed prefixes.
    pub fn new(prefix: impl Into<String>, local: impl Into<String>) -> Result<Self, DocumentError> {
        let prefix = prefix.into();
        let local = local.into();
        if !is_ncname(&prefix) || local.is_empty() {
            return Err(DocumentError::InvalidQualifiedName(format!("{prefix}:{local}")));
        }
        Ok(Self { prefix, local })
    }

    /// The namespace prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The part after the prefix.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Returns true if the name can be written as an XML element name.
    ///
    /// Record ids only appear in attribute values, so their local part may be
    /// any path. Attribute keys become elements and must be NCNames.
    #[must_use]
    pub fn is_element_name(&self) -> bool {
        is_ncname(&self.local)
    }
}

// NCName-style: letter or underscore, then letters, digits, '-', '_', '.'.
fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl FromStr for QualifiedName {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, local) = s
            .split_once(':')
            .ok_or_else(|| DocumentError::InvalidQualifiedName(s.to_string()))?;
        Self::new(prefix, local)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
