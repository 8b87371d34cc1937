//! Fluent traversal surface over a [`PropertyGraph`]
//!
//! ```
//! use pipegraph::graph::{PropertyGraph, Vertex};
//!
//! let mut graph = PropertyGraph::new();
//! let alice = graph.add_vertex("person").unwrap();
//! let bob = graph.add_vertex("person").unwrap();
//! graph.add_edge(alice, "loves", bob).unwrap();
//!
//! let loved: Vec<_> = graph
//!     .traversal()
//!     .v_ids([alice])
//!     .out_e(&["loves"])
//!     .in_v()
//!     .map(Vertex::id)
//!     .to_list();
//! assert_eq!(loved, vec![bob]);
//! ```

use super::{
    AdjacentPipe, BreadthFirstPipe, ComparisonFilter, DepthFirstPipe, DuplicateFilterPipe,
    EdgeVerticesPipe, EdgesPipe, FilterFunctionPipe, FunctionPipe, IdPipe, LabelFilterPipe,
    LabelPipe, Pipe, PropertyFilterPipe, PropertyMapPipe, PropertyPipe, RangeFilterPipe, Visit,
};
use crate::error::GraphResult;
use crate::graph::{
    Direction, Edge, Element, ElementId, Label, PropertyGraph, PropertyMap, PropertyValue,
    Vertex, VertexId,
};
use std::hash::Hash;
use tracing::warn;

impl PropertyGraph {
    /// Entry point of the fluent traversal API
    pub fn traversal(&self) -> TraversalSource<'_> {
        TraversalSource { graph: self }
    }
}

fn to_labels(labels: &[&str]) -> Vec<Label> {
    labels.iter().map(|label| Label::new(*label)).collect()
}

/// Seeds traversals from the vertices or edges of one graph
#[derive(Clone, Copy)]
pub struct TraversalSource<'g> {
    graph: &'g PropertyGraph,
}

impl<'g> TraversalSource<'g> {
    /// All vertices
    pub fn v(&self) -> GraphTraversal<'g, &'g Vertex> {
        self.start(self.graph.vertices())
    }

    /// The vertices with the given ids, in order; unknown ids are skipped
    pub fn v_ids(&self, ids: impl IntoIterator<Item = VertexId>) -> GraphTraversal<'g, &'g Vertex> {
        let graph = self.graph;
        let ids: Vec<VertexId> = ids.into_iter().collect();
        self.start(ids.into_iter().filter_map(move |id| graph.vertex(id).ok()))
    }

    /// All edges
    pub fn e(&self) -> GraphTraversal<'g, &'g Edge> {
        self.start(self.graph.edges())
    }

    /// Traversal over arbitrary seed items
    pub fn start<E, I>(&self, seeds: I) -> GraphTraversal<'g, E>
    where
        I: IntoIterator<Item = E>,
        I::IntoIter: 'g,
    {
        GraphTraversal {
            graph: self.graph,
            iter: Box::new(seeds.into_iter()),
        }
    }
}

/// A lazily evaluated traversal producing items of type `E`
pub struct GraphTraversal<'g, E> {
    graph: &'g PropertyGraph,
    iter: Box<dyn Iterator<Item = E> + 'g>,
}

impl<'g, E: 'g> GraphTraversal<'g, E> {
    pub fn graph(&self) -> &'g PropertyGraph {
        self.graph
    }

    /// Append an arbitrary pipe
    pub fn then<P>(self, mut pipe: P) -> GraphResult<GraphTraversal<'g, P::Item>>
    where
        P: Pipe<'g, Start = E> + 'g,
    {
        pipe.set_starts(self.iter)?;
        Ok(GraphTraversal {
            graph: self.graph,
            iter: Box::new(pipe),
        })
    }

    /// Append a freshly built pipe; a failure ends the traversal
    fn chain<P>(self, pipe: GraphResult<P>) -> GraphTraversal<'g, P::Item>
    where
        P: Pipe<'g, Start = E> + 'g,
    {
        let graph = self.graph;
        match pipe.and_then(|pipe| self.then(pipe)) {
            Ok(traversal) => traversal,
            Err(err) => {
                warn!("Traversal step rejected: {}", err);
                GraphTraversal {
                    graph,
                    iter: Box::new(std::iter::empty()),
                }
            }
        }
    }

    pub fn filter<F>(self, predicate: F) -> GraphTraversal<'g, E>
    where
        F: FnMut(&E) -> bool + 'g,
    {
        self.chain(Ok(FilterFunctionPipe::new(predicate)))
    }

    pub fn map<T, F>(self, function: F) -> GraphTraversal<'g, T>
    where
        F: FnMut(E) -> T + 'g,
        T: 'g,
    {
        self.chain(Ok(FunctionPipe::new(function)))
    }

    /// Items at positions `low..high`
    pub fn range(self, low: usize, high: usize) -> GraphTraversal<'g, E> {
        self.chain(RangeFilterPipe::new(low, Some(high)))
    }

    pub fn to_list(self) -> Vec<E> {
        self.iter.collect()
    }

    pub fn first(mut self) -> Option<E> {
        self.iter.next()
    }
}

impl<'g, E: Eq + Hash + Clone + 'g> GraphTraversal<'g, E> {
    pub fn dedup(self) -> GraphTraversal<'g, E> {
        self.chain(Ok(DuplicateFilterPipe::new()))
    }
}

impl<'g, T: Element + ?Sized + 'g> GraphTraversal<'g, &'g T> {
    /// Elements whose property `key` equals `value`
    pub fn has(self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.has_compare(key, ComparisonFilter::Equal, value)
    }

    pub fn has_compare(
        self,
        key: &str,
        filter: ComparisonFilter,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.chain(Ok(PropertyFilterPipe::new(key, value, filter)))
    }

    /// Elements carrying one of `labels`
    pub fn has_label(self, labels: &[&str]) -> Self {
        self.chain(LabelFilterPipe::new(to_labels(labels), ComparisonFilter::Equal))
    }

    pub fn id(self) -> GraphTraversal<'g, ElementId> {
        self.chain(Ok(IdPipe::new()))
    }

    pub fn label(self) -> GraphTraversal<'g, &'g Label> {
        self.chain(Ok(LabelPipe::new()))
    }

    pub fn property(self, key: &str) -> GraphTraversal<'g, PropertyValue> {
        self.chain(Ok(PropertyPipe::new(key)))
    }

    pub fn property_map(self) -> GraphTraversal<'g, PropertyMap> {
        self.chain(Ok(PropertyMapPipe::new()))
    }
}

impl<'g> GraphTraversal<'g, &'g Vertex> {
    pub fn out_e(self, labels: &[&str]) -> GraphTraversal<'g, &'g Edge> {
        let pipe = EdgesPipe::out(self.graph, to_labels(labels));
        self.chain(Ok(pipe))
    }

    pub fn in_e(self, labels: &[&str]) -> GraphTraversal<'g, &'g Edge> {
        let pipe = EdgesPipe::in_(self.graph, to_labels(labels));
        self.chain(Ok(pipe))
    }

    pub fn both_e(self, labels: &[&str]) -> GraphTraversal<'g, &'g Edge> {
        let pipe = EdgesPipe::both(self.graph, to_labels(labels));
        self.chain(Ok(pipe))
    }

    pub fn out(self, labels: &[&str]) -> Self {
        let pipe = AdjacentPipe::new(self.graph, Direction::Out, to_labels(labels));
        self.chain(Ok(pipe))
    }

    pub fn in_(self, labels: &[&str]) -> Self {
        let pipe = AdjacentPipe::new(self.graph, Direction::In, to_labels(labels));
        self.chain(Ok(pipe))
    }

    pub fn both(self, labels: &[&str]) -> Self {
        let pipe = AdjacentPipe::new(self.graph, Direction::Both, to_labels(labels));
        self.chain(Ok(pipe))
    }

    /// Breadth-first walk; without an explicit bound the graph's configured
    /// `max_traversal_depth` applies.
    pub fn breadth_first(
        self,
        direction: Direction,
        labels: &[&str],
        max_depth: Option<usize>,
    ) -> GraphTraversal<'g, Visit<'g>> {
        let max_depth = max_depth.or(self.graph.config().max_traversal_depth);
        let pipe = BreadthFirstPipe::new(self.graph, direction, to_labels(labels), max_depth);
        self.chain(Ok(pipe))
    }

    pub fn depth_first(
        self,
        direction: Direction,
        labels: &[&str],
        max_depth: Option<usize>,
    ) -> GraphTraversal<'g, Visit<'g>> {
        let max_depth = max_depth.or(self.graph.config().max_traversal_depth);
        let pipe = DepthFirstPipe::new(self.graph, direction, to_labels(labels), max_depth);
        self.chain(Ok(pipe))
    }
}

impl<'g> GraphTraversal<'g, &'g Edge> {
    /// Tail vertex of each edge
    pub fn out_v(self) -> GraphTraversal<'g, &'g Vertex> {
        let pipe = EdgeVerticesPipe::new(self.graph, Direction::Out);
        self.chain(Ok(pipe))
    }

    /// Head vertex of each edge
    pub fn in_v(self) -> GraphTraversal<'g, &'g Vertex> {
        let pipe = EdgeVerticesPipe::new(self.graph, Direction::In);
        self.chain(Ok(pipe))
    }

    pub fn both_v(self) -> GraphTraversal<'g, &'g Vertex> {
        let pipe = EdgeVerticesPipe::new(self.graph, Direction::Both);
        self.chain(Ok(pipe))
    }
}

impl<'g, E> Iterator for GraphTraversal<'g, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.iter.next()
    }
}
