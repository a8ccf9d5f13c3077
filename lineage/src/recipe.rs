//! Provenance of a recipe run: who wrote it and what it is about.
//!
//! The recipe document is built once per run from the recipe's
//! documentation section. It uses its own namespace registry and is never
//! merged into artifact documents.

use crate::config::LineageConfig;
use crate::document::{display_value, Attributes, ProvDocument, ProvenanceDocument, QualifiedName};
use crate::errors::{Result, SchemaError};
use crate::namespace::{Namespaces, ATTRIBUTE, AUTHOR, RECIPE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Local name of the single recipe entity.
pub const RECIPE_ENTITY: &str = "recipe";

/// One recipe author. Every field other than `name` becomes an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Author name, used as the agent id.
    pub name: String,
    /// Extra fields such as affiliation or ORCID, in document order.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Author {
    /// Creates an author without extra fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: IndexMap::new(),
        }
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// The documentation section of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDocumentation {
    /// Free-text description.
    pub description: String,
    /// Projects the recipe belongs to.
    pub projects: Vec<String>,
    /// Literature references.
    pub references: Vec<String>,
    /// Authors, in order.
    pub authors: Vec<Author>,
}

impl RecipeDocumentation {
    /// Reads a record from a JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| schema_error(&e.to_string()).into())
    }

    /// Reads a record from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_yaml::from_str(text).map_err(|e| SchemaError::new(e.to_string()))?;
        Self::from_value(value)
    }
}

/// Maps a deserializer message to a schema error, keeping the missing key.
fn schema_error(message: &str) -> SchemaError {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map_or_else(
            || SchemaError::new(message),
            |(key, _)| SchemaError::missing_key(key),
        )
}

/// Builds the recipe document with the configured base URI.
pub fn build_recipe_provenance(
    documentation: &RecipeDocumentation,
    config: &LineageConfig,
) -> Result<ProvDocument> {
    let mut document = ProvDocument::new();
    build_recipe_provenance_into(documentation, &Namespaces::recipe(&config.base_uri), &mut document)?;
    Ok(document)
}

/// Records the recipe entity, its authors and their attributions in `document`.
pub fn build_recipe_provenance_into<D: ProvenanceDocument>(
    documentation: &RecipeDocumentation,
    namespaces: &Namespaces,
    document: &mut D,
) -> Result<()> {
    document.declare_namespaces(namespaces)?;

    let mut attributes = Attributes::new();
    attributes.insert(
        QualifiedName::new(ATTRIBUTE, "description")?,
        documentation.description.clone(),
    );
    attributes.insert(
        QualifiedName::new(ATTRIBUTE, "projects")?,
        documentation.projects.join(", "),
    );
    attributes.insert(
        QualifiedName::new(ATTRIBUTE, "references")?,
        documentation.references.join(", "),
    );
    let recipe = document.entity(QualifiedName::new(RECIPE, RECIPE_ENTITY)?, attributes)?;

    for author in &documentation.authors {
        let mut fields = Attributes::new();
        for (key, value) in &author.extra {
            fields.insert(QualifiedName::new(ATTRIBUTE, key.as_str())?, display_value(value));
        }
        let agent = document.agent(QualifiedName::new(AUTHOR, author.name.as_str())?, fields)?;
        document.was_attributed_to(&recipe, &agent)?;
    }

    info!(authors = documentation.authors.len(), "Built recipe provenance");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LineageError;
    use crate::testing::{sample_documentation, DocumentCall, RecordingDocument};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pairs(attributes: &Attributes) -> Vec<(String, String)> {
        attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_sample_documentation() {
        let doc = build_recipe_provenance(&sample_documentation(), &LineageConfig::default())
            .unwrap();

        assert_eq!(doc.entities().len(), 1);
        assert_eq!(
            pairs(doc.entity_attributes("recipe:recipe").unwrap()),
            vec![
                ("attribute:description".to_string(), "d".to_string()),
                ("attribute:projects".to_string(), "p1, p2".to_string()),
                ("attribute:references".to_string(), "r1".to_string()),
            ]
        );
        assert_eq!(
            pairs(doc.agent_attributes("author:Al").unwrap()),
            vec![("attribute:affiliation".to_string(), "X".to_string())]
        );
        assert_eq!(doc.attributions().len(), 1);
        let edge = doc.attributions().first().unwrap();
        assert_eq!(edge.entity.to_string(), "recipe:recipe");
        assert_eq!(edge.agent.to_string(), "author:Al");
    }

    #[test]
    fn test_uses_recipe_registry_only() {
        let doc = build_recipe_provenance(&sample_documentation(), &LineageConfig::default())
            .unwrap();
        let prefixes: Vec<&str> = doc.namespaces().keys().map(String::as_str).collect();
        assert_eq!(prefixes, vec!["recipe", "author", "attribute"]);
        assert_eq!(
            doc.namespaces().get("author").map(String::as_str),
            Some("http://www.esmvaltool.org/author")
        );
    }

    #[test]
    fn test_no_authors_means_no_agents() {
        let mut documentation = sample_documentation();
        documentation.authors.clear();
        documentation.projects.clear();

        let doc = build_recipe_provenance(&documentation, &LineageConfig::default()).unwrap();

        assert!(doc.agents().is_empty());
        assert!(doc.attributions().is_empty());
        let attributes = doc.entity_attributes("recipe:recipe").unwrap();
        assert_eq!(
            attributes.get(&"attribute:projects".parse::<QualifiedName>().unwrap()),
            Some(&String::new())
        );
    }

    #[test]
    fn test_missing_key_is_schema_error() {
        let err = RecipeDocumentation::from_value(json!({
            "description": "d",
            "projects": [],
            "authors": [],
        }))
        .unwrap_err();

        match err {
            LineageError::Schema(schema) => {
                assert_eq!(schema.key.as_deref(), Some("references"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_author_without_name_is_schema_error() {
        let err = RecipeDocumentation::from_value(json!({
            "description": "d",
            "projects": [],
            "references": [],
            "authors": [{"affiliation": "X"}],
        }))
        .unwrap_err();
        assert_eq!(err.code(), "LINEAGE-SCHEMA");
    }

    #[test]
    fn test_from_yaml_keeps_extra_author_fields_in_order() {
        let documentation = RecipeDocumentation::from_yaml_str(
            "description: Sea ice\n\
             projects: [c3s-magic]\n\
             references: [acknow_project]\n\
             authors:\n\
             - name: righi_mattia\n\
             \x20 institute: DLR\n\
             \x20 orcid: 0000-0003-3827-5950\n",
        )
        .unwrap();

        let author = &documentation.authors[0];
        assert_eq!(author.name, "righi_mattia");
        assert_eq!(author.extra.keys().collect::<Vec<_>>(), vec!["institute", "orcid"]);
    }

    #[test]
    fn test_collaborator_sees_attribution_per_author() {
        let documentation = RecipeDocumentation {
            authors: vec![Author::new("Al"), Author::new("Bo").with_field("orcid", 7)],
            ..sample_documentation()
        };
        let mut recording = RecordingDocument::new();

        build_recipe_provenance_into(
            &documentation,
            &Namespaces::recipe("http://example.org/"),
            &mut recording,
        )
        .unwrap();

        let kinds: Vec<&str> = recording.calls().iter().map(DocumentCall::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "namespace",
                "namespace",
                "namespace",
                "entity",
                "agent",
                "attribution",
                "agent",
                "attribution",
            ]
        );
        assert_eq!(
            recording.calls()[6],
            DocumentCall::Agent {
                id: "author:Bo".to_string(),
                attributes: vec![("attribute:orcid".to_string(), "7".to_string())],
            }
        );
    }
}
