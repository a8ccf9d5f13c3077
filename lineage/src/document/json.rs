//! PROV-JSON serialization.

use super::{Attributes, ProvDocument};
use serde_json::{json, Map, Value};

pub(super) fn to_prov_json(doc: &ProvDocument) -> Value {
    let mut root = Map::new();

    let prefixes: Map<String, Value> = doc
        .namespaces()
        .iter()
        .map(|(prefix, uri)| (prefix.clone(), Value::String(uri.clone())))
        .collect();
    root.insert("prefix".into(), Value::Object(prefixes));

    if !doc.entities().is_empty() {
        let entities = doc
            .entities()
            .iter()
            .map(|(id, attrs)| (id.to_string(), attributes_json(attrs)))
            .collect();
        root.insert("entity".into(), Value::Object(entities));
    }
    if !doc.activities().is_empty() {
        let activities = doc
            .activities()
            .iter()
            .map(|id| (id.to_string(), json!({})))
            .collect();
        root.insert("activity".into(), Value::Object(activities));
    }
    if !doc.agents().is_empty() {
        let agents = doc
            .agents()
            .iter()
            .map(|(id, attrs)| (id.to_string(), attributes_json(attrs)))
            .collect();
        root.insert("agent".into(), Value::Object(agents));
    }
    // Relations have no ids of their own; PROV-JSON keys them by blank nodes.
    if !doc.derivations().is_empty() {
        let derivations = doc
            .derivations()
            .iter()
            .enumerate()
            .map(|(i, d)| {
                (
                    format!("_:wDF{}", i + 1),
                    json!({
                        "prov:generatedEntity": d.generated.to_string(),
                        "prov:usedEntity": d.used.to_string(),
                        "prov:activity": d.activity.to_string(),
                    }),
                )
            })
            .collect();
        root.insert("wasDerivedFrom".into(), Value::Object(derivations));
    }
    if !doc.attributions().is_empty() {
        let attributions = doc
            .attributions()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                (
                    format!("_:wAT{}", i + 1),
                    json!({
                        "prov:entity": a.entity.to_string(),
                        "prov:agent": a.agent.to_string(),
                    }),
                )
            })
            .collect();
        root.insert("wasAttributedTo".into(), Value::Object(attributions));
    }

    Value::Object(root)
}

fn attributes_json(attributes: &Attributes) -> Value {
    Value::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use crate::document::{Attributes, ProvDocument, ProvenanceDocument};
    use crate::namespace::Namespaces;
    use serde_json::json;

    #[test]
    fn test_prov_json_shape() {
        let mut doc = ProvDocument::new();
        doc.declare_namespaces(&Namespaces::recipe("http://www.esmvaltool.org/"))
            .unwrap();
        let mut attrs = Attributes::new();
        attrs.insert("attribute:institute".parse().unwrap(), "DLR".to_string());
        let al = doc.agent("author:Al".parse().unwrap(), attrs).unwrap();
        let recipe = doc
            .entity("recipe:recipe".parse().unwrap(), Attributes::new())
            .unwrap();
        doc.was_attributed_to(&recipe, &al).unwrap();

        let value = doc.to_prov_json();
        assert_eq!(value["prefix"]["author"], json!("http://www.esmvaltool.org/author"));
        assert_eq!(value["agent"]["author:Al"]["attribute:institute"], json!("DLR"));
        assert_eq!(
            value["wasAttributedTo"]["_:wAT1"],
            json!({"prov:entity": "recipe:recipe", "prov:agent": "author:Al"})
        );
        assert!(value.get("wasDerivedFrom").is_none());
    }
}
