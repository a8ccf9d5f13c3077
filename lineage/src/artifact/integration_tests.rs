//! Integration tests for lineage across several artifacts.

#[cfg(test)]
mod tests {
    use crate::artifact::{LineageGraph, Task, TrackedArtifact};
    use crate::config::LineageConfig;
    use crate::document::{EntityRef, ProvenanceDocument};
    use crate::errors::{LineageError, StateError};
    use crate::export::{ExportFormat, Exporter};
    use crate::testing::{
        attributes, diamond_graph, DocumentCall, FailingRenderer, RecordingDocument,
        RecordingRenderer,
    };
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn exporter(renderer: RecordingRenderer) -> Exporter {
        Exporter::with_renderer(LineageConfig::default(), renderer)
    }

    #[test]
    fn test_diamond_shares_root_entity() {
        let mut graph = diamond_graph().unwrap();

        graph.initialize_lineage("d.nc", &Task::new("diag/mean")).unwrap();

        let doc = graph.document("d.nc").unwrap();
        let entities: Vec<&str> = doc.entities().keys().map(|k| k.local()).collect();
        assert_eq!(entities.len(), 4);
        assert_eq!(entities.iter().filter(|e| **e == "a.nc").count(), 1);
        assert!(graph.iter().all(TrackedArtifact::is_initialized));
    }

    #[test]
    fn test_document_is_union_of_ancestors() {
        let mut graph = diamond_graph().unwrap();
        graph.initialize_lineage("d.nc", "prep").unwrap();

        let d = graph.document("d.nc").unwrap();
        for ancestor in ["a.nc", "b.nc", "c.nc"] {
            let doc = graph.document(ancestor).unwrap();
            for entity in doc.entities().keys() {
                assert!(d.entities().contains_key(entity), "missing {entity}");
            }
            for activity in doc.activities() {
                assert!(d.activities().contains(activity));
            }
            for edge in doc.derivations() {
                assert!(d.derivations().contains(edge));
            }
        }

        let own: Vec<String> = d
            .derivations()
            .iter()
            .filter(|e| e.generated.to_string() == "file:d.nc")
            .map(|e| e.used.to_string())
            .collect();
        assert_eq!(own, vec!["file:b.nc", "file:c.nc"]);
    }

    #[test]
    fn test_ancestors_inherit_descendant_task() {
        let mut graph = diamond_graph().unwrap();
        graph.initialize_lineage("b.nc", "regrid").unwrap();

        assert!(graph.is_initialized("a.nc").unwrap());
        assert!(!graph.is_initialized("c.nc").unwrap());
        let a = graph.get("a.nc").unwrap();
        assert_eq!(a.activity().unwrap().to_string(), "task:regrid");

        graph.initialize_lineage("d.nc", "mean").unwrap();
        let c = graph.get("c.nc").unwrap();
        assert_eq!(c.activity().unwrap().to_string(), "task:mean");
        // `a.nc` keeps the task it was first initialized with.
        assert_eq!(
            graph.get("a.nc").unwrap().activity().unwrap().to_string(),
            "task:regrid"
        );
    }

    #[test]
    fn test_second_initialization_leaves_graph_unchanged() {
        let mut graph = diamond_graph().unwrap();
        graph.initialize_lineage("d.nc", "t").unwrap();
        let before = graph.document("d.nc").cloned();

        let err = graph.initialize_lineage("d.nc", "other").unwrap_err();

        assert!(matches!(
            err,
            LineageError::State(StateError::AlreadyInitialized { .. })
        ));
        assert_eq!(err.to_string(), "Provenance of d.nc already initialized");
        assert_eq!(graph.document("d.nc").cloned(), before);
    }

    #[test]
    fn test_unknown_root_identity() {
        let mut graph = diamond_graph().unwrap();
        let err = graph.initialize_lineage("nope.nc", "t").unwrap_err();
        assert_eq!(err.code(), "LINEAGE-UNKNOWN");
    }

    #[test]
    fn test_assert_derived_from_between_artifacts() {
        let mut graph = diamond_graph().unwrap();
        graph.initialize_lineage("b.nc", "t").unwrap();
        graph.initialize_lineage("c.nc", "t2").unwrap();

        graph.assert_derived_from("c.nc", "b.nc").unwrap();

        let doc = graph.document("c.nc").unwrap();
        let last = doc.derivations().last().unwrap();
        assert_eq!(last.generated.to_string(), "file:c.nc");
        assert_eq!(last.used.to_string(), "file:b.nc");
        assert_eq!(last.activity.to_string(), "task:t2");
    }

    #[test]
    fn test_assert_derived_from_external_entity() {
        let mut graph = diamond_graph().unwrap();
        graph.initialize_lineage("a.nc", "t").unwrap();
        let external = EntityRef::new("file:obs/era5.nc".parse().unwrap());

        graph.assert_derived_from("a.nc", external).unwrap();

        let doc = graph.document("a.nc").unwrap();
        assert!(doc.entity_attributes("file:obs/era5.nc").is_some());
    }

    #[test]
    fn test_recording_document_sees_recursive_initialization() {
        let mut graph: LineageGraph<RecordingDocument> =
            LineageGraph::with_config(&LineageConfig::default());
        graph
            .track(TrackedArtifact::new("a.nc", IndexMap::new()))
            .unwrap();
        graph
            .track(TrackedArtifact::new("b.nc", attributes(&[("k", "v")])).with_ancestors(["a.nc"]))
            .unwrap();

        graph.initialize_lineage("b.nc", "t").unwrap();

        let a = graph.document("a.nc").unwrap();
        assert!(a.calls_of("update").is_empty());
        let b = graph.document("b.nc").unwrap();
        assert_eq!(
            b.calls_of("update"),
            vec![&DocumentCall::Update {
                merged_calls: a.calls().len()
            }]
        );
        assert_eq!(
            b.calls_of("entity"),
            vec![&DocumentCall::Entity {
                id: "file:b.nc".to_string(),
                attributes: vec![("attribute:k".to_string(), "v".to_string())],
            }]
        );
    }

    #[test]
    fn test_export_writes_files_next_to_artifact() {
        let dir = TempDir::new().unwrap();
        let identity = dir.path().join("tas.nc").to_string_lossy().into_owned();
        let mut graph = LineageGraph::new();
        graph
            .track(TrackedArtifact::new(identity.as_str(), attributes(&[("a", "1")])))
            .unwrap();
        graph.initialize_lineage(&identity, "t").unwrap();

        let renderer = RecordingRenderer::new();
        graph
            .export_lineage(&identity, &exporter(renderer.clone()))
            .unwrap();

        let xml = std::fs::read_to_string(dir.path().join("tas_provenance.xml")).unwrap();
        assert!(xml.contains("prov:document"));
        let png = std::fs::read(dir.path().join("tas_provenance.png")).unwrap();
        assert_eq!(png, b"png");
        assert_eq!(renderer.formats(), vec![ExportFormat::Png]);
        assert_eq!(
            renderer.sources(),
            vec![graph.document(&identity).unwrap().to_dot()]
        );
    }

    #[test]
    fn test_export_uninitialized_artifact_fails() {
        let graph = diamond_graph().unwrap();
        let err = graph
            .export_lineage("a.nc", &exporter(RecordingRenderer::new()))
            .unwrap_err();
        assert!(matches!(err, LineageError::State(StateError::NotInitialized { .. })));
    }

    #[test]
    fn test_failed_render_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let identity = dir.path().join("pr.nc").to_string_lossy().into_owned();
        let mut graph = LineageGraph::new();
        graph
            .track(TrackedArtifact::new(identity.as_str(), IndexMap::new()))
            .unwrap();
        graph.initialize_lineage(&identity, "t").unwrap();

        let failing = Exporter::with_renderer(
            LineageConfig::default(),
            FailingRenderer::new(ExportFormat::Png, "dot not found"),
        );
        let err = graph.export_lineage(&identity, &failing).unwrap_err();

        assert_eq!(err.code(), "LINEAGE-EXPORT");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
