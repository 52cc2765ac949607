//! Benchmark roadmap rebuilds and route queries.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use marga::{GraphBuilder, GraphNode, GridSnapshot, PlannerConfig, PlanningEngine};

/// Walled room with a grid of square pillars.
fn pillar_room(size: usize) -> GridSnapshot {
    let mut cells = vec![0i8; size * size];
    for i in 0..size {
        cells[i] = 100;
        cells[(size - 1) * size + i] = 100;
        cells[i * size] = 100;
        cells[i * size + size - 1] = 100;
    }
    let spacing = size / 5;
    for py in 1..5 {
        for px in 1..5 {
            let (cx, cy) = (px * spacing, py * spacing);
            for y in cy - 3..cy + 3 {
                for x in cx - 3..cx + 3 {
                    cells[y * size + x] = 100;
                }
            }
        }
    }
    GridSnapshot::new(size, size, 0.05, cells).unwrap()
}

fn bench_rebuild(c: &mut Criterion) {
    let config = PlannerConfig::default();
    let mut group = c.benchmark_group("rebuild");
    for size in [100, 200, 400] {
        let grid = pillar_room(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &grid, |b, grid| {
            b.iter(|| GraphBuilder::new(&config).build(black_box(grid), &[]).unwrap())
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let engine = PlanningEngine::default();
    engine.map_to_graph(pillar_room(200));
    let start = GraphNode::new(10.0, 10.0);
    let goal = GraphNode::new(190.0, 190.0);

    let mut group = c.benchmark_group("query");
    for k in [1, 3, 5] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| engine.get_path(black_box(start), black_box(goal), k))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_query);
criterion_main!(benches);
