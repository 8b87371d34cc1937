use pipegraph::graph::{Element, PropertyGraph, PropertyValue, Vertex};
use pipegraph::index::{property_keys, IndexMode};
use pipegraph::ErrorKind;

fn people(count: i64) -> PropertyGraph {
    let mut graph = PropertyGraph::new();
    for i in 0..count {
        graph
            .add_vertex_with(None, "person", |v| {
                v.set_property("name", format!("Person{}", i))?
                    .set_property("age", 20 + i % 5)?;
                Ok(())
            })
            .unwrap();
    }
    graph
}

#[test]
fn test_automatic_index_backfills_and_follows_graph() {
    let mut graph = people(10);
    let index = graph
        .create_vertices_index("by-age", property_keys(["age"]), None)
        .unwrap();
    assert_eq!(index.mode(), IndexMode::Automatic);
    assert_eq!(index.count("age", &PropertyValue::Integer(21)), 2);

    let newcomer = graph
        .add_vertex_with(None, "person", |v| {
            v.set_property("age", 21)?;
            Ok(())
        })
        .unwrap();
    let found: Vec<_> = graph
        .lookup_vertices("by-age", "age", &PropertyValue::Integer(21))
        .unwrap()
        .map(Vertex::id)
        .collect();
    assert_eq!(found.len(), 3);
    assert!(found.contains(&newcomer));

    graph.set_property(newcomer, "age", 99).unwrap();
    let index = graph.vertices_index("by-age").unwrap();
    assert_eq!(index.count("age", &PropertyValue::Integer(21)), 2);
    assert_eq!(index.count("age", &PropertyValue::Integer(99)), 1);

    graph.remove_vertex(newcomer, false).unwrap();
    let index = graph.vertices_index("by-age").unwrap();
    assert_eq!(index.count("age", &PropertyValue::Integer(99)), 0);
    assert!(!index.contains(newcomer));
}

#[test]
fn test_filtered_automatic_index() {
    let mut graph = people(3);
    graph.add_vertex("robot").unwrap();
    let robots_only = graph
        .create_vertices_index(
            "robots",
            Box::new(|_: &Vertex| vec![("kind".to_string(), PropertyValue::from("robot"))]),
            Some(Box::new(|v: &Vertex| v.label().as_str() == "robot")),
        )
        .unwrap();
    assert_eq!(robots_only.count("kind", &"robot".into()), 1);
}

#[test]
fn test_index_range_lookup() {
    let graph = {
        let mut graph = people(10);
        graph
            .create_vertices_index("by-age", property_keys(["age"]), None)
            .unwrap();
        graph
    };
    let index = graph.vertices_index("by-age").unwrap();
    let older = index.range("age", PropertyValue::Integer(23)..);
    assert_eq!(older.len(), 4);

    let reversed = index.range("age", PropertyValue::Integer(7)..=PropertyValue::Integer(3));
    assert!(reversed.is_empty());
}

#[test]
fn test_manual_index_entries() {
    let mut graph = people(2);
    let ids: Vec<_> = graph.vertices().map(Vertex::id).collect();
    graph.create_manual_vertices_index("vip").unwrap();

    assert!(graph.put_vertex_index_entry("vip", "tier", "gold", ids[0]).unwrap());
    assert!(!graph.put_vertex_index_entry("vip", "tier", "gold", ids[0]).unwrap());
    assert!(graph.put_vertex_index_entry("vip", "tier", "gold", ids[1]).unwrap());
    assert_eq!(
        graph
            .lookup_vertices("vip", "tier", &"gold".into())
            .unwrap()
            .count(),
        2
    );

    assert!(graph
        .remove_vertex_index_entry("vip", "tier", &"gold".into(), ids[1])
        .unwrap());
    graph.remove_vertex(ids[0], false).unwrap();
    assert!(graph.vertices_index("vip").unwrap().is_empty());
}

#[test]
fn test_index_errors() {
    let mut graph = people(1);
    let id = graph.vertices().next().unwrap().id();
    graph
        .create_vertices_index("by-name", property_keys(["name"]), None)
        .unwrap();

    let err = graph.create_manual_vertices_index("by-name").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateId);

    let err = graph
        .put_vertex_index_entry("by-name", "name", "x", id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalState);

    let err = graph.lookup_vertices("missing", "name", &"x".into()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ElementNotFound);

    graph.drop_vertices_index("by-name").unwrap();
    assert_eq!(graph.vertices_indices().count(), 0);
}

#[test]
fn test_edge_index() {
    let mut graph = people(3);
    let ids: Vec<_> = graph.vertices().map(Vertex::id).collect();
    graph
        .create_edges_index("by-since", property_keys(["since"]), None)
        .unwrap();
    let edge = graph
        .add_edge_with(None, ids[0], "knows", ids[1], |e| {
            e.set_property("since", 2020)?;
            Ok(())
        })
        .unwrap();
    graph.add_edge(ids[1], "knows", ids[2]).unwrap();

    let found: Vec<_> = graph
        .lookup_edges("by-since", "since", &PropertyValue::Integer(2020))
        .unwrap()
        .map(|e| e.id())
        .collect();
    assert_eq!(found, vec![edge]);
    assert_eq!(graph.edges_index("by-since").unwrap().len(), 1);
}
