//! Social Network Walkthrough
//!
//! Builds a small professional community, indexes it, and answers a few
//! questions with the fluent traversal API: who follows whom, friends of
//! friends, reach within N hops, and a rolled-back bulk edit.

use pipegraph::graph::{Direction, Element, EventLog, GraphEvent, PropertyGraph, Vertex, VertexId};
use pipegraph::index::property_keys;
use pipegraph::pipes::ComparisonFilter;
use pipegraph::{GraphConfig, GraphResult, PropertyValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const NUM_USERS: usize = 200;

const COMMUNITIES: [&str; 5] = [
    "AI/ML Engineers",
    "Backend Engineers",
    "DevOps/SRE",
    "Data Engineers",
    "Security Engineers",
];

const FIRST_NAMES: [&str; 10] = [
    "Alice", "Bob", "Carlos", "Diana", "Elena", "Frank", "Grace", "Hiro", "Isha", "Jake",
];

fn build_network(rng: &mut StdRng) -> GraphResult<(PropertyGraph, Vec<VertexId>)> {
    let config = GraphConfig::new("community").with_max_traversal_depth(3);
    let mut graph = PropertyGraph::with_config(config);

    let mut users = Vec::with_capacity(NUM_USERS);
    for i in 0..NUM_USERS {
        let name = format!("{} #{}", FIRST_NAMES[i % FIRST_NAMES.len()], i);
        let community = COMMUNITIES[rng.gen_range(0..COMMUNITIES.len())];
        let years = rng.gen_range(0..25i64);
        let id = graph.add_vertex_with(None, "User", |v| {
            v.set_property("name", name)?
                .set_property("community", community)?
                .set_property("years", years)?;
            Ok(())
        })?;
        users.push(id);
    }

    for (i, &user) in users.iter().enumerate() {
        for _ in 0..rng.gen_range(1..5) {
            let other = users[rng.gen_range(0..NUM_USERS)];
            if other != users[i] {
                graph.add_edge(user, "FOLLOWS", other)?;
            }
        }
    }
    Ok((graph, users))
}

fn name_of(vertex: &Vertex) -> String {
    vertex
        .try_property("name")
        .and_then(|v| v.as_string().map(str::to_string))
        .unwrap_or_default()
}

fn main() -> GraphResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Pipegraph v{}", pipegraph::version());
    println!("==========================================");

    let mut rng = StdRng::seed_from_u64(42);
    let (mut graph, users) = build_network(&mut rng)?;
    let log = EventLog::new();
    graph.subscribe(log.clone());

    let stats = graph.statistics();
    println!("\n=== Network ===");
    println!("Users: {}, follow edges: {}", stats.vertex_count, stats.edge_count);

    graph.create_vertices_index("by-community", property_keys(["community"]), None)?;
    println!("\n=== Communities (automatic index) ===");
    for community in COMMUNITIES {
        let members = graph
            .vertices_index("by-community")?
            .count("community", &PropertyValue::from(community));
        println!("{:<22} {:>4} members", community, members);
    }

    let seed = users[0];
    let seed_name = name_of(graph.vertex(seed)?);

    println!("\n=== {} follows ===", seed_name);
    for followed in graph.traversal().v_ids([seed]).out(&["FOLLOWS"]) {
        println!("  {}", name_of(followed));
    }

    let fof = graph
        .traversal()
        .v_ids([seed])
        .out(&["FOLLOWS"])
        .out(&["FOLLOWS"])
        .map(|v: &Vertex| v.id())
        .filter(move |id| *id != seed)
        .dedup()
        .count();
    println!("Friends of friends: {}", fof);

    let veterans = graph
        .traversal()
        .v_ids([seed])
        .breadth_first(Direction::Out, &["FOLLOWS"], None)
        .map(|visit| visit.vertex)
        .has_compare("years", ComparisonFilter::GreaterThanOrEqual, 15)
        .count();
    println!("Veterans within 3 hops: {}", veterans);

    println!("\n=== Rolled-back bulk edit ===");
    let events_before = log.len();
    graph.begin_transaction()?;
    for &user in users.iter().take(10) {
        graph.set_property(user, "community", "Reorg")?;
    }
    graph.rollback()?;
    let reorg = graph
        .vertices_index("by-community")?
        .count("community", &PropertyValue::from("Reorg"));
    let changes = log.events()[events_before..]
        .iter()
        .filter(|e| matches!(e, GraphEvent::PropertyChanged { .. }))
        .count();
    println!("Members of 'Reorg' after rollback: {} ({} property events)", reorg, changes);

    let schema = graph.schema_graph("community-schema")?;
    println!("\n=== Schema ===");
    for label in schema.vertices() {
        println!("{} x{}", label.label(), label.property("count")?);
    }

    Ok(())
}
