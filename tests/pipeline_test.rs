use pipegraph::graph::{Direction, Edge, Label, PropertyGraph, Vertex, VertexId};
use pipegraph::pipes::{
    AdjacentPipe, AggregatePipe, ComparisonFilter, CopySplitPipe, Cursor, DuplicateFilterPipe,
    EdgeVerticesPipe, EdgesPipe, FunctionPipe, MergeMode, Pipe, Pipeline, PropertyFilterPipe,
    PropertyPipe, SideEffectPipe,
};
use pipegraph::{ErrorKind, PropertyValue};

fn social() -> (PropertyGraph, Vec<VertexId>) {
    let mut graph = PropertyGraph::new();
    let names = ["Alice", "Bob", "Carol", "Dave"];
    let ids: Vec<VertexId> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            graph
                .add_vertex_with(None, "person", |v| {
                    v.set_property("name", *name)?
                        .set_property("age", 20 + 10 * i as i64)?;
                    Ok(())
                })
                .unwrap()
        })
        .collect();
    graph.add_edge(ids[0], "knows", ids[1]).unwrap();
    graph.add_edge(ids[0], "knows", ids[2]).unwrap();
    graph.add_edge(ids[1], "knows", ids[3]).unwrap();
    graph.add_edge(ids[2], "knows", ids[3]).unwrap();
    graph.add_edge(ids[3], "likes", ids[0]).unwrap();
    (graph, ids)
}

#[test]
fn test_friends_of_friends_pipeline() {
    let (graph, ids) = social();
    let knows = vec![Label::new("knows")];

    let mut pipeline = Pipeline::new()
        .then(AdjacentPipe::new(&graph, Direction::Out, knows.clone()))
        .unwrap()
        .then(AdjacentPipe::new(&graph, Direction::Out, knows))
        .unwrap()
        .then(FunctionPipe::new(Vertex::id))
        .unwrap()
        .then(DuplicateFilterPipe::new())
        .unwrap();
    assert_eq!(pipeline.len(), 4);

    pipeline
        .set_starts(Box::new(graph.vertex(ids[0]).into_iter()))
        .unwrap();
    assert_eq!(pipeline.collect::<Vec<_>>(), vec![ids[3]]);
}

#[test]
fn test_edge_stage_round_trip() {
    let (graph, ids) = social();
    let tails: Vec<VertexId> = Pipeline::from_starts(graph.vertex(ids[3]).into_iter())
        .then(EdgesPipe::in_(&graph, vec![]))
        .unwrap()
        .then(EdgeVerticesPipe::new(&graph, Direction::Out))
        .unwrap()
        .map(|v: &Vertex| v.id())
        .collect();
    assert_eq!(tails, vec![ids[1], ids[2]]);
}

#[test]
fn test_property_filter_and_values() {
    let (graph, _) = social();
    let names: Vec<PropertyValue> = Pipeline::from_starts(graph.vertices())
        .then(PropertyFilterPipe::new(
            "age",
            40,
            ComparisonFilter::GreaterThanOrEqual,
        ))
        .unwrap()
        .then(PropertyPipe::<Vertex>::new("name"))
        .unwrap()
        .collect();
    assert_eq!(names, vec!["Carol".into(), "Dave".into()]);
}

#[test]
fn test_cursor_is_single_pass() {
    let (graph, ids) = social();
    let pipeline = Pipeline::from_starts(graph.vertex(ids[0]).into_iter())
        .then(EdgesPipe::out(&graph, vec![]))
        .unwrap();
    let mut cursor = Cursor::new(pipeline);

    let mut seen = Vec::new();
    while cursor.move_next() {
        let edge: &&Edge = cursor.current().unwrap();
        seen.push(edge.in_vertex());
    }
    assert_eq!(seen, vec![ids[1], ids[2]]);
    assert!(!cursor.move_next());
    assert!(cursor.current().is_none());

    let mut pipeline = cursor.into_inner();
    let err = pipeline
        .set_starts(Box::new(graph.vertex(ids[1]).into_iter()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalState);
}

type VertexPipe<'g> = Box<dyn Pipe<'g, Start = &'g Vertex, Item = &'g Vertex> + 'g>;

fn neighbours_both_ways(graph: &PropertyGraph) -> Vec<VertexPipe<'_>> {
    vec![
        Box::new(AdjacentPipe::new(graph, Direction::Out, vec![])),
        Box::new(AdjacentPipe::new(graph, Direction::In, vec![])),
    ]
}

#[test]
fn test_copy_split_over_graph() {
    let (graph, ids) = social();
    let split = CopySplitPipe::new(neighbours_both_ways(&graph), MergeMode::Exhaustive).unwrap();
    let around: Vec<VertexId> = Pipeline::from_starts(graph.vertex(ids[0]).into_iter())
        .then(split)
        .unwrap()
        .map(|v: &Vertex| v.id())
        .collect();
    assert_eq!(around, vec![ids[1], ids[2], ids[3]]);
}

#[test]
fn test_side_effects_observe_laziness() {
    let (graph, _) = social();
    let mut pulled = 0usize;
    {
        let aggregate = AggregatePipe::new();
        let buffer = aggregate.aggregate();
        let mut pipeline = Pipeline::from_starts(graph.vertices())
            .then(SideEffectPipe::new(|_: &&Vertex| pulled += 1))
            .unwrap()
            .then(aggregate)
            .unwrap();
        assert!(pipeline.next().is_some());
        assert_eq!(buffer.get().len(), 4);
    }
    assert_eq!(pulled, 4);
}
