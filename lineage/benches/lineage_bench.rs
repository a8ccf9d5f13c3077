//! Benchmarks for lineage initialization.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use indexmap::IndexMap;
use lineage::artifact::{LineageGraph, Task, TrackedArtifact};

/// `depth` layers of `width` artifacts, each derived from the whole layer below.
fn layered_graph(width: usize, depth: usize) -> LineageGraph {
    let mut graph = LineageGraph::new();
    for layer in 0..depth {
        for i in 0..width {
            let ancestors: Vec<String> = if layer == 0 {
                Vec::new()
            } else {
                (0..width).map(|j| format!("l{}_{j}.nc", layer - 1)).collect()
            };
            let mut attributes = IndexMap::new();
            attributes.insert("layer".to_string(), serde_json::json!(layer));
            graph
                .track(TrackedArtifact::new(format!("l{layer}_{i}.nc"), attributes).with_ancestors(ancestors))
                .unwrap();
        }
    }
    graph
        .track(TrackedArtifact::new("final.nc", IndexMap::new()).with_ancestors(
            (0..width).map(|j| format!("l{}_{j}.nc", depth - 1)),
        ))
        .unwrap();
    graph
}

fn initialization_benchmark(c: &mut Criterion) {
    let task = Task::new("bench");

    c.bench_function("initialize_wide_4x8", |b| {
        b.iter_batched(
            || layered_graph(8, 4),
            |mut graph| {
                graph.initialize_lineage("final.nc", &task).unwrap();
                black_box(graph)
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("initialize_deep_32x1", |b| {
        b.iter_batched(
            || layered_graph(1, 32),
            |mut graph| {
                graph.initialize_lineage("final.nc", &task).unwrap();
                black_box(graph)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, initialization_benchmark);
criterion_main!(benches);
