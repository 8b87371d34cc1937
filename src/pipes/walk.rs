//! Depth-first and breadth-first walks over plain edges
//!
//! Both walks key their bookkeeping by vertex id, so every vertex is emitted
//! at most once per walk even when the graph has cycles. Seeds sit at depth 0;
//! a vertex at depth `max_depth` is emitted but not expanded. A bounded
//! depth-first walk re-expands a vertex it later reaches by a shorter path, so
//! it reaches the same vertices as the breadth-first walk with the same bound.

use super::{Pipe, Source, Starts};
use crate::error::GraphResult;
use crate::graph::{Direction, Label, PropertyGraph, Vertex, VertexId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::trace;

/// A vertex reached by a walk, with its distance in hops from the seed
#[derive(Debug, Clone, Copy)]
pub struct Visit<'g> {
    pub vertex: &'g Vertex,
    pub depth: usize,
}

impl<'g> Visit<'g> {
    pub fn id(&self) -> VertexId {
        self.vertex.id()
    }
}

impl PartialEq for Visit<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.vertex.id() == other.vertex.id() && self.depth == other.depth
    }
}

struct Walker<'g> {
    graph: &'g PropertyGraph,
    direction: Direction,
    labels: Vec<Label>,
    max_depth: Option<usize>,
}

impl<'g> Walker<'g> {
    fn expands(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    /// Whether a vertex already expanded at `seen` must be expanded again at `depth`
    fn improves(&self, seen: Option<usize>, depth: usize) -> bool {
        match seen {
            None => true,
            Some(seen) => self.max_depth.is_some() && depth < seen,
        }
    }

    fn neighbors(&self, vertex: VertexId) -> Vec<&'g Vertex> {
        match self.graph.neighbors(vertex, self.direction, &self.labels) {
            Ok(ids) => ids.filter_map(|id| self.graph.vertex(id).ok()).collect(),
            Err(err) => {
                trace!("Walk skipped {}: {}", vertex, err);
                Vec::new()
            }
        }
    }
}

/// Breadth-first walk: all seeds first, then their neighbors, and so on
pub struct BreadthFirstPipe<'g> {
    walker: Walker<'g>,
    queue: VecDeque<Visit<'g>>,
    visited: FxHashSet<VertexId>,
    seeded: bool,
    input: Source<'g, &'g Vertex>,
}

impl<'g> BreadthFirstPipe<'g> {
    pub fn new(
        graph: &'g PropertyGraph,
        direction: Direction,
        labels: Vec<Label>,
        max_depth: Option<usize>,
    ) -> Self {
        BreadthFirstPipe {
            walker: Walker {
                graph,
                direction,
                labels,
                max_depth,
            },
            queue: VecDeque::new(),
            visited: FxHashSet::default(),
            seeded: false,
            input: Source::new(),
        }
    }

    fn enqueue(&mut self, vertex: &'g Vertex, depth: usize) {
        if self.visited.insert(vertex.id()) {
            self.queue.push_back(Visit { vertex, depth });
        }
    }
}

impl<'g> Iterator for BreadthFirstPipe<'g> {
    type Item = Visit<'g>;

    fn next(&mut self) -> Option<Visit<'g>> {
        if !self.seeded {
            self.seeded = true;
            while let Some(seed) = self.input.pull() {
                self.enqueue(seed, 0);
            }
        }
        let visit = self.queue.pop_front()?;
        if self.walker.expands(visit.depth) {
            for neighbor in self.walker.neighbors(visit.vertex.id()) {
                self.enqueue(neighbor, visit.depth + 1);
            }
        }
        Some(visit)
    }
}

impl<'g> Pipe<'g> for BreadthFirstPipe<'g> {
    type Start = &'g Vertex;

    fn set_starts(&mut self, starts: Starts<'g, &'g Vertex>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Depth-first walk: each seed's reachable set is explored before the next
/// seed is pulled. Neighbors are visited in adjacency order.
pub struct DepthFirstPipe<'g> {
    walker: Walker<'g>,
    stack: Vec<Visit<'g>>,
    /// Smallest depth each vertex was expanded at
    expanded: FxHashMap<VertexId, usize>,
    emitted: FxHashSet<VertexId>,
    input: Source<'g, &'g Vertex>,
}

impl<'g> DepthFirstPipe<'g> {
    pub fn new(
        graph: &'g PropertyGraph,
        direction: Direction,
        labels: Vec<Label>,
        max_depth: Option<usize>,
    ) -> Self {
        DepthFirstPipe {
            walker: Walker {
                graph,
                direction,
                labels,
                max_depth,
            },
            stack: Vec::new(),
            expanded: FxHashMap::default(),
            emitted: FxHashSet::default(),
            input: Source::new(),
        }
    }
}

impl<'g> Iterator for DepthFirstPipe<'g> {
    type Item = Visit<'g>;

    fn next(&mut self) -> Option<Visit<'g>> {
        loop {
            let visit = match self.stack.pop() {
                Some(visit) => visit,
                None => Visit {
                    vertex: self.input.pull()?,
                    depth: 0,
                },
            };
            let id = visit.vertex.id();
            let seen = self.expanded.get(&id).copied();
            if !self.walker.improves(seen, visit.depth) {
                continue;
            }
            self.expanded.insert(id, visit.depth);
            if self.walker.expands(visit.depth) {
                let depth = visit.depth + 1;
                let neighbors = self.walker.neighbors(id);
                for neighbor in neighbors.into_iter().rev() {
                    let seen = self.expanded.get(&neighbor.id()).copied();
                    if self.walker.improves(seen, depth) {
                        self.stack.push(Visit {
                            vertex: neighbor,
                            depth,
                        });
                    }
                }
            }
            if self.emitted.insert(id) {
                return Some(visit);
            }
        }
    }
}

impl<'g> Pipe<'g> for DepthFirstPipe<'g> {
    type Start = &'g Vertex;

    fn set_starts(&mut self, starts: Starts<'g, &'g Vertex>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0 -> 1 -> 3, 0 -> 2 -> 3, 3 -> 0 (cycle)
    fn diamond() -> (PropertyGraph, Vec<VertexId>) {
        let mut graph = PropertyGraph::new();
        let ids: Vec<VertexId> = (0..4).map(|_| graph.add_vertex("node").unwrap()).collect();
        graph.add_edge(ids[0], "to", ids[1]).unwrap();
        graph.add_edge(ids[0], "to", ids[2]).unwrap();
        graph.add_edge(ids[1], "to", ids[3]).unwrap();
        graph.add_edge(ids[2], "to", ids[3]).unwrap();
        graph.add_edge(ids[3], "back", ids[0]).unwrap();
        (graph, ids)
    }

    fn walk<'g, P>(mut pipe: P, graph: &'g PropertyGraph, seed: VertexId) -> Vec<(VertexId, usize)>
    where
        P: Pipe<'g, Start = &'g Vertex, Item = Visit<'g>>,
    {
        pipe.set_starts(Box::new(graph.vertex(seed).into_iter())).unwrap();
        pipe.map(|visit| (visit.id(), visit.depth)).collect()
    }

    #[test]
    fn test_breadth_first_order_and_depths() {
        let (graph, ids) = diamond();
        let pipe = BreadthFirstPipe::new(&graph, Direction::Out, vec![], None);
        assert_eq!(
            walk(pipe, &graph, ids[0]),
            vec![(ids[0], 0), (ids[1], 1), (ids[2], 1), (ids[3], 2)]
        );
    }

    #[test]
    fn test_depth_first_order() {
        let (graph, ids) = diamond();
        let pipe = DepthFirstPipe::new(&graph, Direction::Out, vec![], None);
        assert_eq!(
            walk(pipe, &graph, ids[0]),
            vec![(ids[0], 0), (ids[1], 1), (ids[3], 2), (ids[2], 1)]
        );
    }

    #[test]
    fn test_depth_bound() {
        let (graph, ids) = diamond();
        let pipe = BreadthFirstPipe::new(&graph, Direction::Out, vec![], Some(1));
        assert_eq!(walk(pipe, &graph, ids[0]).len(), 3);

        let pipe = DepthFirstPipe::new(&graph, Direction::Out, vec![], Some(0));
        assert_eq!(walk(pipe, &graph, ids[0]), vec![(ids[0], 0)]);
    }

    #[test]
    fn test_bounded_depth_first_follows_shorter_paths() {
        // a -> b -> x, a -> x, x -> y: x is first reached at depth 2 via b
        let mut graph = PropertyGraph::new();
        let ids: Vec<VertexId> = (0..4).map(|_| graph.add_vertex("node").unwrap()).collect();
        let (a, b, x, y) = (ids[0], ids[1], ids[2], ids[3]);
        graph.add_edge(a, "to", b).unwrap();
        graph.add_edge(a, "to", x).unwrap();
        graph.add_edge(b, "to", x).unwrap();
        graph.add_edge(x, "to", y).unwrap();

        let pipe = DepthFirstPipe::new(&graph, Direction::Out, vec![], Some(2));
        let visits = walk(pipe, &graph, a);
        assert_eq!(visits, vec![(a, 0), (b, 1), (x, 2), (y, 2)]);

        let mut reached: Vec<VertexId> = visits.iter().map(|(id, _)| *id).collect();
        let mut expected: Vec<VertexId> = walk(
            BreadthFirstPipe::new(&graph, Direction::Out, vec![], Some(2)),
            &graph,
            a,
        )
        .into_iter()
        .map(|(id, _)| id)
        .collect();
        reached.sort();
        expected.sort();
        assert_eq!(reached, expected);
    }

    #[test]
    fn test_label_restricted_walk() {
        let (graph, ids) = diamond();
        let pipe = BreadthFirstPipe::new(&graph, Direction::In, vec![Label::new("back")], None);
        assert_eq!(walk(pipe, &graph, ids[0]), vec![(ids[0], 0), (ids[3], 1)]);
    }

    #[test]
    fn test_multiple_seeds_are_visited_once() {
        let (graph, ids) = diamond();
        let mut pipe = BreadthFirstPipe::new(&graph, Direction::Both, vec![], None);
        pipe.set_starts(Box::new(graph.vertices())).unwrap();
        let visits: Vec<_> = pipe.collect();
        assert_eq!(visits.len(), ids.len());
        assert!(visits.iter().all(|visit| visit.depth == 0));
    }
}
