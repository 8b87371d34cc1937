use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pipegraph::graph::{Direction, PropertyGraph, PropertyValue, VertexId};
use pipegraph::index::property_keys;

/// Ring of `size` people, each also knowing the vertex ten steps ahead
fn build_social(size: usize) -> (PropertyGraph, Vec<VertexId>) {
    let mut graph = PropertyGraph::new();
    let ids: Vec<VertexId> = (0..size)
        .map(|i| {
            graph
                .add_vertex_with(None, "Person", |v| {
                    v.set_property("name", format!("Person{}", i))?
                        .set_property("age", (i % 100) as i64)?;
                    Ok(())
                })
                .unwrap()
        })
        .collect();
    for i in 0..size {
        graph.add_edge(ids[i], "KNOWS", ids[(i + 1) % size]).unwrap();
        graph.add_edge(ids[i], "KNOWS", ids[(i + 10) % size]).unwrap();
    }
    (graph, ids)
}

/// Benchmark vertex insertion throughput
fn bench_vertex_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_insertion");

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut graph = PropertyGraph::new();
                for i in 0..size {
                    let id = graph.add_vertex("Person").unwrap();
                    graph.set_property(id, "name", format!("Person{}", i)).unwrap();
                    graph.set_property(id, "age", (i % 100) as i64).unwrap();
                }
            });
        });
    }
    group.finish();
}

/// Benchmark label scan through the fluent traversal
fn bench_label_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_scan");

    for size in [100, 1000, 10_000].iter() {
        let (mut graph, _) = build_social(*size);
        for _ in 0..*size / 10 {
            graph.add_vertex("Company").unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let people = graph.traversal().v().has_label(&["Person"]).count();
                criterion::black_box(people);
            });
        });
    }
    group.finish();
}

/// Benchmark one- and two-hop expansion plus a bounded BFS
fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    let (graph, ids) = build_social(1000);
    let seed = ids[0];

    group.bench_function("1-hop", |b| {
        b.iter(|| {
            let friends = graph.traversal().v_ids([seed]).out(&["KNOWS"]).count();
            criterion::black_box(friends);
        });
    });

    group.bench_function("2-hop", |b| {
        b.iter(|| {
            let friends = graph
                .traversal()
                .v_ids([seed])
                .out(&["KNOWS"])
                .out(&["KNOWS"])
                .count();
            criterion::black_box(friends);
        });
    });

    group.bench_function("bfs-depth-4", |b| {
        b.iter(|| {
            let reached = graph
                .traversal()
                .v_ids([seed])
                .breadth_first(Direction::Out, &["KNOWS"], Some(4))
                .count();
            criterion::black_box(reached);
        });
    });

    group.finish();
}

/// Benchmark property filtering with and without an automatic index
fn bench_property_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_lookup");
    let (mut graph, _) = build_social(10_000);
    let target = PropertyValue::Integer(42);

    group.bench_function("scan", |b| {
        b.iter(|| {
            let matches = graph.traversal().v().has("age", 42).count();
            criterion::black_box(matches);
        });
    });

    graph
        .create_vertices_index("by-age", property_keys(["age"]), None)
        .unwrap();
    group.bench_function("index", |b| {
        b.iter(|| {
            let matches = graph
                .lookup_vertices("by-age", "age", &target)
                .unwrap()
                .count();
            criterion::black_box(matches);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_vertex_insertion,
    bench_label_scan,
    bench_traversal,
    bench_property_lookup,
);
criterion_main!(benches);
