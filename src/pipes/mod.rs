//! Lazy traversal pipeline ("pipes")
//!
//! A pipe is a single-input, single-output lazy stage: it pulls items from
//! one upstream sequence and produces its own sequence on demand. Every pipe
//! is an [`Iterator`]; [`Pipe::set_starts`] attaches the upstream, which is
//! only legal before the first item is pulled. Pipes are single-pass: once a
//! pipe reports the end of its sequence it stays exhausted.
//!
//! Stages are grouped by family:
//! - [`map`]: 1:1 transformations (id, label, property, function)
//! - [`filter`]: predicates, comparisons, dedup, range, sampling
//! - [`graph`]: adjacency expansion (edges of a vertex, vertices of an edge)
//! - [`branch`]: copy-split with fair or exhaustive merging
//! - [`walk`]: depth-first and breadth-first walks
//! - [`side_effect`]: aggregation and counting
//!
//! [`Pipeline`] chains stages into a pipe of its own, and [`GraphTraversal`]
//! offers the fluent query surface on top of a [`PropertyGraph`].
//!
//! [`PropertyGraph`]: crate::graph::PropertyGraph

pub mod branch;
pub mod filter;
pub mod graph;
pub mod map;
pub mod pipeline;
pub mod side_effect;
pub mod traversal;
pub mod walk;

use crate::error::{GraphError, GraphResult};

pub use branch::{CopySplitPipe, ExhaustMerge, FairMerge, MergeMode};
pub use filter::{
    CollectionFilterPipe, ComparisonFilter, DuplicateFilterPipe, FilterFunctionPipe,
    IdFilterPipe, LabelFilterPipe, ObjectFilterPipe, PropertyFilterPipe, RandomFilterPipe,
    RangeFilterPipe, UniqueConsecutivePipe,
};
pub use graph::{AdjacentPipe, EdgeVerticesPipe, EdgesPipe};
pub use map::{FunctionPipe, IdPipe, LabelPipe, PropertyMapPipe, PropertyPipe};
pub use pipeline::{Cursor, Pipeline};
pub use side_effect::{AggregatePipe, CountPipe, Shared, SideEffectPipe};
pub use traversal::{GraphTraversal, TraversalSource};
pub use walk::{BreadthFirstPipe, DepthFirstPipe, Visit};

/// Upstream sequence of a pipe
pub type Starts<'a, S> = Box<dyn Iterator<Item = S> + 'a>;

/// A lazy single-input stage
pub trait Pipe<'a>: Iterator {
    /// Item type consumed from upstream
    type Start;

    /// Attach the upstream sequence.
    ///
    /// Fails with `IllegalState` once the pipe has started enumerating.
    fn set_starts(&mut self, starts: Starts<'a, Self::Start>) -> GraphResult<()>;
}

/// Upstream holder shared by every pipe: tracks whether enumeration started
/// and fuses the sequence once it ends.
pub struct Source<'a, S> {
    starts: Option<Starts<'a, S>>,
    started: bool,
    exhausted: bool,
}

impl<'a, S> Source<'a, S> {
    pub fn new() -> Self {
        Source {
            starts: None,
            started: false,
            exhausted: false,
        }
    }

    pub fn set(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        if self.started {
            return Err(GraphError::IllegalState(
                "cannot set the starts of a pipe that already started".to_string(),
            ));
        }
        self.starts = Some(starts);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Pull the next upstream item; `None` forever after the first `None`
    pub fn pull(&mut self) -> Option<S> {
        self.started = true;
        if self.exhausted {
            return None;
        }
        let item = self.starts.as_mut().and_then(Iterator::next);
        if item.is_none() {
            self.exhausted = true;
            self.starts = None;
        }
        item
    }
}

impl<'a, S> Default for Source<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}
