use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use hwr_core::scene::{Placement, RenderNode};
use hwr_data::{RecordedNode, RootSceneState, SceneOp};

fn bench_scene(c: &mut Criterion) {
    // 1,000 top-level nodes, every other one animating.
    let nodes: Vec<Arc<RecordedNode>> = (0..1_000)
        .map(|i| RecordedNode::new(format!("node-{i}")))
        .collect();

    let mut group = c.benchmark_group("Root scene");

    group.bench_function("Apply 1k additions", |b| {
        b.iter(|| {
            let mut state = RootSceneState::new();
            let ops = nodes
                .iter()
                .enumerate()
                .map(|(i, node)| SceneOp::AddNode {
                    node: node.clone(),
                    placement: if i % 2 == 0 { Placement::Front } else { Placement::Back },
                })
                .collect();
            state.apply(ops);
            black_box(state.stats(0));
        });
    });

    let dyn_nodes: Vec<Arc<dyn RenderNode>> = nodes
        .iter()
        .map(|n| n.clone() as Arc<dyn RenderNode>)
        .collect();

    group.bench_function("Tick 500 animating nodes", |b| {
        b.iter(|| {
            let mut state = RootSceneState::new();
            let ops = dyn_nodes
                .iter()
                .step_by(2)
                .map(|node| SceneOp::AttachAnimating {
                    id: node.id(),
                    node: Arc::downgrade(node),
                })
                .collect();
            state.apply(ops);
            black_box(state.tick(0));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_scene);
criterion_main!(benches);
