//! Graph stages: expand elements over the adjacency of a [`PropertyGraph`]

use super::{Pipe, Source, Starts};
use crate::error::GraphResult;
use crate::graph::element::label_matches;
use crate::graph::{Direction, Edge, EdgeId, Element, Label, PropertyGraph, Vertex};
use std::collections::VecDeque;

type SidedEdgeIds<'g> = Box<dyn Iterator<Item = (Direction, &'g EdgeId)> + 'g>;

/// Vertex → its incident edges (OutE / InE / BothE).
///
/// Emission follows the insertion order of the vertex's adjacency sets; with
/// `Direction::Both` the outgoing edges come first.
pub struct EdgesPipe<'g> {
    graph: &'g PropertyGraph,
    direction: Direction,
    labels: Vec<Label>,
    current: Option<SidedEdgeIds<'g>>,
    input: Source<'g, &'g Vertex>,
}

impl<'g> EdgesPipe<'g> {
    pub fn new(graph: &'g PropertyGraph, direction: Direction, labels: Vec<Label>) -> Self {
        EdgesPipe {
            graph,
            direction,
            labels,
            current: None,
            input: Source::new(),
        }
    }

    pub fn out(graph: &'g PropertyGraph, labels: Vec<Label>) -> Self {
        Self::new(graph, Direction::Out, labels)
    }

    pub fn in_(graph: &'g PropertyGraph, labels: Vec<Label>) -> Self {
        Self::new(graph, Direction::In, labels)
    }

    pub fn both(graph: &'g PropertyGraph, labels: Vec<Label>) -> Self {
        Self::new(graph, Direction::Both, labels)
    }

    fn expand(&self, vertex: &'g Vertex) -> SidedEdgeIds<'g> {
        let out = vertex.out_edges.iter().map(|id| (Direction::Out, id));
        let in_ = vertex.in_edges.iter().map(|id| (Direction::In, id));
        match self.direction {
            Direction::Out => Box::new(out),
            Direction::In => Box::new(in_),
            Direction::Both => Box::new(out.chain(in_)),
        }
    }

    /// Next edge together with the side of the current vertex it was reached from
    fn next_with_side(&mut self) -> Option<(Direction, &'g Edge)> {
        loop {
            if let Some(ids) = self.current.as_mut() {
                for (side, id) in ids {
                    let Ok(edge) = self.graph.edge(*id) else {
                        continue;
                    };
                    if label_matches(&self.labels, edge.label()) {
                        return Some((side, edge));
                    }
                }
            }
            let vertex = self.input.pull()?;
            self.current = Some(self.expand(vertex));
        }
    }
}

impl<'g> Iterator for EdgesPipe<'g> {
    type Item = &'g Edge;

    fn next(&mut self) -> Option<&'g Edge> {
        self.next_with_side().map(|(_, edge)| edge)
    }
}

impl<'g> Pipe<'g> for EdgesPipe<'g> {
    type Start = &'g Vertex;

    fn set_starts(&mut self, starts: Starts<'g, &'g Vertex>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Vertex → adjacent vertices over plain edges (Out / In / Both)
pub struct AdjacentPipe<'g> {
    edges: EdgesPipe<'g>,
}

impl<'g> AdjacentPipe<'g> {
    pub fn new(graph: &'g PropertyGraph, direction: Direction, labels: Vec<Label>) -> Self {
        AdjacentPipe {
            edges: EdgesPipe::new(graph, direction, labels),
        }
    }
}

impl<'g> Iterator for AdjacentPipe<'g> {
    type Item = &'g Vertex;

    fn next(&mut self) -> Option<&'g Vertex> {
        loop {
            let (side, edge) = self.edges.next_with_side()?;
            let target = match side {
                Direction::In => edge.out_vertex(),
                _ => edge.in_vertex(),
            };
            if let Ok(vertex) = self.edges.graph.vertex(target) {
                return Some(vertex);
            }
        }
    }
}

impl<'g> Pipe<'g> for AdjacentPipe<'g> {
    type Start = &'g Vertex;

    fn set_starts(&mut self, starts: Starts<'g, &'g Vertex>) -> GraphResult<()> {
        self.edges.set_starts(starts)
    }
}

/// Edge → its vertices (OutV / InV / BothV).
///
/// `Direction::Out` is the tail of the edge, `Direction::In` its head; `Both`
/// emits the tail then the head.
pub struct EdgeVerticesPipe<'g> {
    graph: &'g PropertyGraph,
    direction: Direction,
    pending: VecDeque<&'g Vertex>,
    input: Source<'g, &'g Edge>,
}

impl<'g> EdgeVerticesPipe<'g> {
    pub fn new(graph: &'g PropertyGraph, direction: Direction) -> Self {
        EdgeVerticesPipe {
            graph,
            direction,
            pending: VecDeque::new(),
            input: Source::new(),
        }
    }
}

impl<'g> Iterator for EdgeVerticesPipe<'g> {
    type Item = &'g Vertex;

    fn next(&mut self) -> Option<&'g Vertex> {
        loop {
            if let Some(vertex) = self.pending.pop_front() {
                return Some(vertex);
            }
            let edge = self.input.pull()?;
            let ends = match self.direction {
                Direction::Out => vec![edge.out_vertex()],
                Direction::In => vec![edge.in_vertex()],
                Direction::Both => vec![edge.out_vertex(), edge.in_vertex()],
            };
            self.pending
                .extend(ends.into_iter().filter_map(|id| self.graph.vertex(id).ok()));
        }
    }
}

impl<'g> Pipe<'g> for EdgeVerticesPipe<'g> {
    type Start = &'g Edge;

    fn set_starts(&mut self, starts: Starts<'g, &'g Edge>) -> GraphResult<()> {
        self.input.set(starts)
    }
}
