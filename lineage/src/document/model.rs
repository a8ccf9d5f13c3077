//! In-memory PROV document.

use super::{
    dot, json, xml, ActivityRef, AgentRef, Attributes, EntityRef, ProvenanceDocument,
    QualifiedName,
};
use crate::errors::{DocumentError, ExportError};
use crate::namespace::Namespace;
use indexmap::{IndexMap, IndexSet};

/// "`generated` was derived from `used` via `activity`".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Derivation {
    /// The derived entity.
    pub generated: QualifiedName,
    /// The source entity.
    pub used: QualifiedName,
    /// The activity that performed the derivation.
    pub activity: QualifiedName,
}

/// "`entity` is attributed to `agent`".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribution {
    /// The attributed entity.
    pub entity: QualifiedName,
    /// The responsible agent.
    pub agent: QualifiedName,
}

/// A provenance graph held in memory.
///
/// Records and relations are kept in insertion order so serializations are
/// stable. Every collection is a set keyed by qualified id, which makes
/// [`ProvenanceDocument::update`] idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvDocument {
    namespaces: IndexMap<String, String>,
    entities: IndexMap<QualifiedName, Attributes>,
    activities: IndexSet<QualifiedName>,
    agents: IndexMap<QualifiedName, Attributes>,
    derivations: IndexSet<Derivation>,
    attributions: IndexSet<Attribution>,
}

impl ProvDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared namespaces, prefix to URI.
    #[must_use]
    pub fn namespaces(&self) -> &IndexMap<String, String> {
        &self.namespaces
    }

    /// Entities and their attributes.
    #[must_use]
    pub fn entities(&self) -> &IndexMap<QualifiedName, Attributes> {
        &self.entities
    }

    /// Activities.
    #[must_use]
    pub fn activities(&self) -> &IndexSet<QualifiedName> {
        &self.activities
    }

    /// Agents and their attributes.
    #[must_use]
    pub fn agents(&self) -> &IndexMap<QualifiedName, Attributes> {
        &self.agents
    }

    /// Derivation edges.
    #[must_use]
    pub fn derivations(&self) -> &IndexSet<Derivation> {
        &self.derivations
    }

    /// Attribution edges.
    #[must_use]
    pub fn attributions(&self) -> &IndexSet<Attribution> {
        &self.attributions
    }

    /// Looks up an entity's attributes by its `prefix:local` id.
    #[must_use]
    pub fn entity_attributes(&self, id: &str) -> Option<&Attributes> {
        let id: QualifiedName = id.parse().ok()?;
        self.entities.get(&id)
    }

    /// Looks up an agent's attributes by its `prefix:local` id.
    #[must_use]
    pub fn agent_attributes(&self, id: &str) -> Option<&Attributes> {
        let id: QualifiedName = id.parse().ok()?;
        self.agents.get(&id)
    }

    /// Returns true if the document has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.activities.is_empty() && self.agents.is_empty()
    }

    fn check_declared(&self, id: &QualifiedName) -> Result<(), DocumentError> {
        if self.namespaces.contains_key(id.prefix()) {
            Ok(())
        } else {
            Err(DocumentError::UndeclaredNamespace {
                prefix: id.prefix().to_string(),
            })
        }
    }

    fn check_record(&self, id: &QualifiedName, attributes: &Attributes) -> Result<(), DocumentError> {
        self.check_declared(id)?;
        attributes.keys().try_for_each(|key| {
            self.check_declared(key)?;
            if key.is_element_name() {
                Ok(())
            } else {
                Err(DocumentError::InvalidQualifiedName(key.to_string()))
            }
        })
    }

    fn check_namespace(&self, namespace: &Namespace) -> Result<(), DocumentError> {
        match self.namespaces.get(&namespace.prefix) {
            Some(existing) if *existing != namespace.uri => Err(DocumentError::NamespaceConflict {
                prefix: namespace.prefix.clone(),
                existing: existing.clone(),
                requested: namespace.uri.clone(),
            }),
            _ => Ok(()),
        }
    }
}

fn merge_attributes(target: &mut Attributes, source: &Attributes) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

impl ProvenanceDocument for ProvDocument {
    fn add_namespace(&mut self, namespace: &Namespace) -> Result<(), DocumentError> {
        self.check_namespace(namespace)?;
        self.namespaces
            .entry(namespace.prefix.clone())
            .or_insert_with(|| namespace.uri.clone());
        Ok(())
    }

    fn entity(
        &mut self,
        id: QualifiedName,
        attributes: Attributes,
    ) -> Result<EntityRef, DocumentError> {
        self.check_record(&id, &attributes)?;
        merge_attributes(self.entities.entry(id.clone()).or_default(), &attributes);
        Ok(EntityRef::new(id))
    }

    fn activity(&mut self, id: QualifiedName) -> Result<ActivityRef, DocumentError> {
        self.check_declared(&id)?;
        self.activities.insert(id.clone());
        Ok(ActivityRef::new(id))
    }

    fn agent(
        &mut self,
        id: QualifiedName,
        attributes: Attributes,
    ) -> Result<AgentRef, DocumentError> {
        self.check_record(&id, &attributes)?;
        merge_attributes(self.agents.entry(id.clone()).or_default(), &attributes);
        Ok(AgentRef::new(id))
    }

    fn was_derived_from(
        &mut self,
        generated: &EntityRef,
        used: &EntityRef,
        activity: &ActivityRef,
    ) -> Result<(), DocumentError> {
        if !self.entities.contains_key(generated.id()) {
            return Err(DocumentError::UnknownRecord {
                kind: "entity",
                id: generated.to_string(),
            });
        }
        if !self.activities.contains(activity.id()) {
            return Err(DocumentError::UnknownRecord {
                kind: "activity",
                id: activity.to_string(),
            });
        }
        // A source from outside this document becomes a bare entity.
        if !self.entities.contains_key(used.id()) {
            self.check_declared(used.id())?;
            self.entities.insert(used.id().clone(), Attributes::new());
        }
        self.derivations.insert(Derivation {
            generated: generated.id().clone(),
            used: used.id().clone(),
            activity: activity.id().clone(),
        });
        Ok(())
    }

    fn was_attributed_to(
        &mut self,
        entity: &EntityRef,
        agent: &AgentRef,
    ) -> Result<(), DocumentError> {
        if !self.entities.contains_key(entity.id()) {
            return Err(DocumentError::UnknownRecord {
                kind: "entity",
                id: entity.to_string(),
            });
        }
        if !self.agents.contains_key(agent.id()) {
            return Err(DocumentError::UnknownRecord {
                kind: "agent",
                id: agent.to_string(),
            });
        }
        self.attributions.insert(Attribution {
            entity: entity.id().clone(),
            agent: agent.id().clone(),
        });
        Ok(())
    }

    fn update(&mut self, other: &Self) -> Result<(), DocumentError> {
        // Validate every binding first so a conflict leaves `self` untouched.
        for (prefix, uri) in &other.namespaces {
            self.check_namespace(&Namespace::new(prefix.clone(), uri.clone()))?;
        }
        for (prefix, uri) in &other.namespaces {
            self.namespaces
                .entry(prefix.clone())
                .or_insert_with(|| uri.clone());
        }
        for (id, attributes) in &other.entities {
            merge_attributes(self.entities.entry(id.clone()).or_default(), attributes);
        }
        self.activities.extend(other.activities.iter().cloned());
        for (id, attributes) in &other.agents {
            merge_attributes(self.agents.entry(id.clone()).or_default(), attributes);
        }
        self.derivations.extend(other.derivations.iter().cloned());
        self.attributions.extend(other.attributions.iter().cloned());
        Ok(())
    }

    fn to_prov_xml(&self) -> Result<String, ExportError> {
        xml::write_prov_xml(self)
    }

    fn to_prov_json(&self) -> serde_json::Value {
        json::to_prov_json(self)
    }

    fn to_dot(&self) -> String {
        dot::write_dot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespaces;
    use pretty_assertions::assert_eq;

    const BASE: &str = "http://www.esmvaltool.org/";

    fn qn(s: &str) -> QualifiedName {
        s.parse().unwrap()
    }

    fn artifact_doc() -> ProvDocument {
        let mut doc = ProvDocument::new();
        doc.declare_namespaces(&Namespaces::artifact(BASE)).unwrap();
        doc
    }

    #[test]
    fn test_namespace_redeclaration_is_noop() {
        let mut doc = artifact_doc();
        doc.declare_namespaces(&Namespaces::artifact(BASE)).unwrap();
        assert_eq!(doc.namespaces().len(), 4);
    }

    #[test]
    fn test_namespace_conflict() {
        let mut doc = artifact_doc();
        let err = doc
            .add_namespace(&Namespace::new("file", "https://elsewhere.org/file"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::NamespaceConflict { .. }));
    }

    #[test]
    fn test_undeclared_prefix_rejected() {
        let mut doc = artifact_doc();
        let err = doc.entity(qn("recipe:recipe"), Attributes::new()).unwrap_err();
        assert_eq!(
            err,
            DocumentError::UndeclaredNamespace {
                prefix: "recipe".to_string()
            }
        );
    }

    #[test]
    fn test_derivation_requires_own_records() {
        let mut doc = artifact_doc();
        let a = doc.entity(qn("file:a.nc"), Attributes::new()).unwrap();
        let b = EntityRef::new(qn("file:b.nc"));
        let task = ActivityRef::new(qn("task:t"));

        assert!(doc.was_derived_from(&a, &b, &task).is_err());

        let task = doc.activity(qn("task:t")).unwrap();
        doc.was_derived_from(&a, &b, &task).unwrap();
        assert!(doc.entities().contains_key(&qn("file:b.nc")));
        assert_eq!(doc.derivations().len(), 1);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut upstream = artifact_doc();
        let mut attrs = Attributes::new();
        attrs.insert(qn("attribute:project"), "CMIP5".to_string());
        upstream.entity(qn("file:a.nc"), attrs).unwrap();
        upstream.activity(qn("task:prep")).unwrap();

        let mut doc = artifact_doc();
        doc.update(&upstream).unwrap();
        let once = doc.clone();
        doc.update(&upstream).unwrap();

        assert_eq!(doc, once);
        assert_eq!(doc.entities().len(), 1);
        assert_eq!(doc.activities().len(), 1);
        assert_eq!(
            doc.entity_attributes("file:a.nc").unwrap()[&qn("attribute:project")],
            "CMIP5"
        );
    }

    #[test]
    fn test_update_conflict_leaves_document_untouched() {
        let mut other = ProvDocument::new();
        other
            .add_namespace(&Namespace::new("file", "https://elsewhere.org/file"))
            .unwrap();
        other.entity(qn("file:x"), Attributes::new()).unwrap();

        let mut doc = artifact_doc();
        let before = doc.clone();
        assert!(doc.update(&other).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_attribute_keys_must_be_xml_names() {
        let mut doc = artifact_doc();
        for key in ["attribute:start year", "attribute:1st"] {
            let mut attrs = Attributes::new();
            attrs.insert(qn(key), "1850".to_string());
            let err = doc.entity(qn("file:a.nc"), attrs).unwrap_err();
            assert_eq!(err, DocumentError::InvalidQualifiedName(key.to_string()));
        }
        assert!(doc.entities().is_empty());
    }

    #[test]
    fn test_attribution_requires_agent() {
        let mut doc = ProvDocument::new();
        doc.declare_namespaces(&Namespaces::recipe(BASE)).unwrap();
        let recipe = doc.entity(qn("recipe:recipe"), Attributes::new()).unwrap();
        let ghost = AgentRef::new(qn("author:Nobody"));
        assert!(doc.was_attributed_to(&recipe, &ghost).is_err());

        let al = doc.agent(qn("author:Al"), Attributes::new()).unwrap();
        doc.was_attributed_to(&recipe, &al).unwrap();
        doc.was_attributed_to(&recipe, &al).unwrap();
        assert_eq!(doc.attributions().len(), 1);
    }
}
