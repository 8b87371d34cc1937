//! Side-effect stages: observe the stream and pass it through

use super::{Pipe, Source, Starts};
use crate::error::GraphResult;
use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Handle to state a pipe writes while it runs, readable by the caller.
#[derive(Debug, Default)]
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared(Rc::new(RefCell::new(value)))
    }

    pub fn get(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.borrow_mut())
    }
}

impl<T: Clone> Shared<T> {
    pub fn snapshot(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(self.0.clone())
    }
}

/// Drains the whole upstream into a shared buffer on the first pull, then
/// emits the buffered items in order.
pub struct AggregatePipe<'a, S> {
    aggregate: Shared<Vec<S>>,
    pending: Option<VecDeque<S>>,
    input: Source<'a, S>,
}

impl<'a, S: Clone> AggregatePipe<'a, S> {
    pub fn new() -> Self {
        AggregatePipe {
            aggregate: Shared::new(Vec::new()),
            pending: None,
            input: Source::new(),
        }
    }

    /// The buffer; complete once the first item has been pulled
    pub fn aggregate(&self) -> Shared<Vec<S>> {
        self.aggregate.clone()
    }
}

impl<'a, S: Clone> Default for AggregatePipe<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: Clone> Iterator for AggregatePipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        if self.pending.is_none() {
            let mut drained = VecDeque::new();
            while let Some(item) = self.input.pull() {
                drained.push_back(item);
            }
            self.aggregate
                .update(|buffer| buffer.extend(drained.iter().cloned()));
            self.pending = Some(drained);
        }
        self.pending.as_mut().and_then(VecDeque::pop_front)
    }
}

impl<'a, S: Clone> Pipe<'a> for AggregatePipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Calls a function on each item as it passes
pub struct SideEffectPipe<'a, S, F> {
    effect: F,
    input: Source<'a, S>,
}

impl<'a, S, F: FnMut(&S)> SideEffectPipe<'a, S, F> {
    pub fn new(effect: F) -> Self {
        SideEffectPipe {
            effect,
            input: Source::new(),
        }
    }
}

impl<'a, S, F: FnMut(&S)> Iterator for SideEffectPipe<'a, S, F> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        let item = self.input.pull()?;
        (self.effect)(&item);
        Some(item)
    }
}

impl<'a, S, F: FnMut(&S)> Pipe<'a> for SideEffectPipe<'a, S, F> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Counts the items that pass through
pub struct CountPipe<'a, S> {
    count: Shared<usize>,
    input: Source<'a, S>,
}

impl<'a, S> CountPipe<'a, S> {
    pub fn new() -> Self {
        CountPipe {
            count: Shared::new(0),
            input: Source::new(),
        }
    }

    pub fn counter(&self) -> Shared<usize> {
        self.count.clone()
    }
}

impl<'a, S> Default for CountPipe<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S> Iterator for CountPipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        let item = self.input.pull()?;
        self.count.update(|count| *count += 1);
        Some(item)
    }
}

impl<'a, S> Pipe<'a> for CountPipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}
