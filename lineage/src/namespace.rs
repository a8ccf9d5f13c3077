//! The fixed set of URI namespaces used to qualify identifiers.

use serde::{Deserialize, Serialize};

/// Prefix for output files.
pub const FILE: &str = "file";
/// Prefix for descriptive attributes.
pub const ATTRIBUTE: &str = "attribute";
/// Prefix for preprocessor steps.
pub const PREPROCESSOR: &str = "preprocessor";
/// Prefix for pipeline tasks.
pub const TASK: &str = "task";
/// Prefix for the recipe itself.
pub const RECIPE: &str = "recipe";
/// Prefix for authors.
pub const AUTHOR: &str = "author";

/// Namespaces declared in every artifact document.
pub const ARTIFACT_PREFIXES: [&str; 4] = [FILE, ATTRIBUTE, PREPROCESSOR, TASK];
/// Namespaces declared in the recipe document.
pub const RECIPE_PREFIXES: [&str; 3] = [RECIPE, AUTHOR, ATTRIBUTE];

/// A namespace binding: a short prefix and the URI it expands to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    /// The prefix used in qualified names.
    pub prefix: String,
    /// The URI the prefix expands to.
    pub uri: String,
}

impl Namespace {
    /// Creates a namespace binding.
    #[must_use]
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// An ordered set of namespace bindings sharing one base URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    bindings: Vec<Namespace>,
}

impl Namespaces {
    /// Binds each prefix to `<base_uri><prefix>`.
    #[must_use]
    pub fn from_prefixes(base_uri: &str, prefixes: &[&str]) -> Self {
        Self {
            bindings: prefixes
                .iter()
                .map(|p| Namespace::new(*p, format!("{base_uri}{p}")))
                .collect(),
        }
    }

    /// The registry declared by every tracked artifact.
    #[must_use]
    pub fn artifact(base_uri: &str) -> Self {
        Self::from_prefixes(base_uri, &ARTIFACT_PREFIXES)
    }

    /// The private registry of the recipe document.
    #[must_use]
    pub fn recipe(base_uri: &str) -> Self {
        Self::from_prefixes(base_uri, &RECIPE_PREFIXES)
    }

    /// Iterates over the bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.bindings.iter()
    }

    /// Looks up the URI bound to a prefix.
    #[must_use]
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|ns| ns.prefix == prefix)
            .map(|ns| ns.uri.as_str())
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://www.esmvaltool.org/";

    #[test]
    fn test_artifact_registry() {
        let ns = Namespaces::artifact(BASE);
        let prefixes: Vec<_> = ns.iter().map(|n| n.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["file", "attribute", "preprocessor", "task"]);
        assert_eq!(ns.uri("task"), Some("http://www.esmvaltool.org/task"));
        assert_eq!(ns.uri("author"), None);
    }

    #[test]
    fn test_recipe_registry_is_independent() {
        let ns = Namespaces::recipe(BASE);
        assert_eq!(ns.len(), 3);
        assert_eq!(ns.uri("author"), Some("http://www.esmvaltool.org/author"));
        assert_eq!(ns.uri("file"), None);
    }
}
