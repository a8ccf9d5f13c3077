//! Ready-made graphs and records for tests.

use indexmap::IndexMap;

use crate::artifact::{LineageGraph, TrackedArtifact};
use crate::errors::Result;
use crate::recipe::{Author, RecipeDocumentation};

/// Builds an attribute map from string pairs.
#[must_use]
pub fn attributes(pairs: &[(&str, &str)]) -> IndexMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), serde_json::Value::String((*v).to_string())))
        .collect()
}

/// `d.nc` derived from `b.nc` and `c.nc`, both derived from `a.nc`.
pub fn diamond_graph() -> Result<LineageGraph> {
    let mut graph = LineageGraph::new();
    let artifacts: [TrackedArtifact; 4] = [
        TrackedArtifact::new("a.nc", attributes(&[("short_name", "tas")])),
        TrackedArtifact::new("b.nc", attributes(&[("step", "regrid")])).with_ancestors(["a.nc"]),
        TrackedArtifact::new("c.nc", attributes(&[("step", "mask")])).with_ancestors(["a.nc"]),
        TrackedArtifact::new("d.nc", attributes(&[("step", "mean")]))
            .with_ancestors(["b.nc", "c.nc"]),
    ];
    for artifact in artifacts {
        graph.track(artifact)?;
    }
    Ok(graph)
}

/// `{description: "d", projects: [p1, p2], references: [r1], authors: [{name: Al, affiliation: X}]}`.
#[must_use]
pub fn sample_documentation() -> RecipeDocumentation {
    RecipeDocumentation {
        description: "d".to_string(),
        projects: vec!["p1".to_string(), "p2".to_string()],
        references: vec!["r1".to_string()],
        authors: vec![Author::new("Al").with_field("affiliation", "X")],
    }
}
