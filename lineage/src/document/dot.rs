//! Graphviz rendering of a PROV document.

use super::{Attributes, ProvDocument, QualifiedName};
use indexmap::{IndexMap, IndexSet};
use std::fmt::Write;

const ENTITY_STYLE: &str = "shape=ellipse, style=filled, fillcolor=\"#FFFC87\", color=\"#808080\"";
const ACTIVITY_STYLE: &str = "shape=box, style=filled, fillcolor=\"#9FB1FC\", color=\"#0000FF\"";
const AGENT_STYLE: &str = "shape=house, style=filled, fillcolor=\"#FED37F\"";
const NOTE_STYLE: &str = "shape=note, fontsize=10, color=\"gray\"";

pub(super) fn write_dot(doc: &ProvDocument) -> String {
    let mut nodes: IndexMap<&QualifiedName, String> = IndexMap::new();
    let mut dot = String::from("digraph provenance {\n  rankdir=BT;\n  charset=\"utf-8\";\n\n");

    let records = doc
        .entities()
        .iter()
        .map(|(id, attrs)| (id, Some(attrs), ENTITY_STYLE))
        .chain(doc.activities().iter().map(|id| (id, None, ACTIVITY_STYLE)))
        .chain(doc.agents().iter().map(|(id, attrs)| (id, Some(attrs), AGENT_STYLE)));

    for (id, attributes, style) in records {
        let node = format!("n{}", nodes.len());
        let _ = writeln!(dot, "  {node} [label=\"{}\", {style}];", escape(&id.to_string()));
        if let Some(attrs) = attributes.filter(|a| !a.is_empty()) {
            write_note(&mut dot, &node, attrs);
        }
        nodes.insert(id, node);
    }
    dot.push('\n');

    let mut generated_by: IndexSet<(&str, &str)> = IndexSet::new();
    for d in doc.derivations() {
        if let (Some(generated), Some(used)) = (nodes.get(&d.generated), nodes.get(&d.used)) {
            let _ = writeln!(dot, "  {generated} -> {used} [label=\"wasDerivedFrom\"];");
        }
        if let (Some(generated), Some(activity)) = (nodes.get(&d.generated), nodes.get(&d.activity)) {
            generated_by.insert((generated.as_str(), activity.as_str()));
        }
    }
    for (generated, activity) in generated_by {
        let _ = writeln!(
            dot,
            "  {generated} -> {activity} [label=\"wasGeneratedBy\", style=dotted];"
        );
    }
    for a in doc.attributions() {
        if let (Some(entity), Some(agent)) = (nodes.get(&a.entity), nodes.get(&a.agent)) {
            let _ = writeln!(dot, "  {entity} -> {agent} [label=\"wasAttributedTo\"];");
        }
    }

    dot.push_str("}\n");
    dot
}

fn write_note(dot: &mut String, node: &str, attributes: &Attributes) {
    let mut label = String::new();
    for (key, value) in attributes {
        let _ = write!(label, "{}: {}\\l", escape(&key.to_string()), escape(value));
    }
    let _ = writeln!(dot, "  {node}_ann [label=\"{label}\", {NOTE_STYLE}];");
    let _ = writeln!(dot, "  {node}_ann -> {node} [style=dashed, arrowhead=none, color=\"gray\"];");
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
