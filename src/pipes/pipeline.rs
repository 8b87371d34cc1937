//! Pipe composition and the move-next cursor protocol

use super::{Pipe, Source, Starts};
use crate::error::GraphResult;
use std::cell::RefCell;
use std::rc::Rc;

type Slot<'a, S> = Rc<RefCell<Source<'a, S>>>;

/// Feeds the first stage of a pipeline from the pipeline's own starts
struct SlotFeed<'a, S> {
    slot: Slot<'a, S>,
}

impl<'a, S> Iterator for SlotFeed<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        self.slot.borrow_mut().pull()
    }
}

/// A chain of pipes, itself a pipe from `S` to `E`.
///
/// ```
/// use pipegraph::pipes::{FunctionPipe, FilterFunctionPipe, Pipe, Pipeline};
///
/// let mut pipeline = Pipeline::new()
///     .then(FilterFunctionPipe::new(|n: &i32| n % 2 == 0))
///     .unwrap()
///     .then(FunctionPipe::new(|n: i32| n * 10))
///     .unwrap();
/// pipeline.set_starts(Box::new(1..=6)).unwrap();
/// assert_eq!(pipeline.collect::<Vec<_>>(), vec![20, 40, 60]);
/// ```
pub struct Pipeline<'a, S, E> {
    head: Slot<'a, S>,
    tail: Starts<'a, E>,
    stages: usize,
    exhausted: bool,
}

impl<'a, S: 'a> Pipeline<'a, S, S> {
    /// Empty pipeline: emits its starts unchanged
    pub fn new() -> Self {
        let head = Rc::new(RefCell::new(Source::new()));
        let feed = SlotFeed { slot: head.clone() };
        Pipeline {
            head,
            tail: Box::new(feed),
            stages: 0,
            exhausted: false,
        }
    }

    /// Pipeline seeded with its starts
    pub fn from_starts(starts: impl Iterator<Item = S> + 'a) -> Self {
        let pipeline = Self::new();
        pipeline.head.borrow_mut().starts = Some(Box::new(starts));
        pipeline
    }
}

impl<'a, S: 'a> Default for Pipeline<'a, S, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: 'a, E: 'a> Pipeline<'a, S, E> {
    /// Append a stage consuming this pipeline's output
    pub fn then<P>(self, mut pipe: P) -> GraphResult<Pipeline<'a, S, P::Item>>
    where
        P: Pipe<'a, Start = E> + 'a,
    {
        pipe.set_starts(self.tail)?;
        Ok(Pipeline {
            head: self.head,
            tail: Box::new(pipe),
            stages: self.stages + 1,
            exhausted: false,
        })
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages == 0
    }
}

impl<'a, S, E> Iterator for Pipeline<'a, S, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        if self.exhausted {
            return None;
        }
        let item = self.tail.next();
        self.exhausted = item.is_none();
        item
    }
}

impl<'a, S, E> Pipe<'a> for Pipeline<'a, S, E> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.head.borrow_mut().set(starts)
    }
}

/// Explicit move-next / current protocol over any pipe.
///
/// `current` is `None` before the first `move_next` and after one returned
/// `false`; once `false` is returned it is returned forever.
pub struct Cursor<I: Iterator> {
    inner: I,
    current: Option<I::Item>,
    finished: bool,
}

impl<I: Iterator> Cursor<I> {
    pub fn new(inner: I) -> Self {
        Cursor {
            inner,
            current: None,
            finished: false,
        }
    }

    pub fn move_next(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.current = self.inner.next();
        self.finished = self.current.is_none();
        !self.finished
    }

    pub fn current(&self) -> Option<&I::Item> {
        self.current.as_ref()
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}
