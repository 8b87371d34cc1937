//! Branch and merge stages

use super::{Pipe, Source, Starts};
use crate::error::{GraphError, GraphResult};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Branch<'a, E> = Box<dyn Iterator<Item = E> + 'a>;

/// How the outputs of several branches are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Round-robin, one item per branch in turn
    Fair,
    /// Drain each branch fully before moving to the next
    Exhaustive,
}

/// Interleaves its inputs round-robin, skipping inputs that have ended
pub struct FairMerge<'a, E> {
    inputs: VecDeque<Branch<'a, E>>,
}

impl<'a, E> FairMerge<'a, E> {
    pub fn new(inputs: Vec<Branch<'a, E>>) -> Self {
        FairMerge {
            inputs: inputs.into(),
        }
    }
}

impl<'a, E> Iterator for FairMerge<'a, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        while let Some(mut input) = self.inputs.pop_front() {
            if let Some(item) = input.next() {
                self.inputs.push_back(input);
                return Some(item);
            }
        }
        None
    }
}

/// Emits everything from the first input, then the second, and so on
pub struct ExhaustMerge<'a, E> {
    inputs: Vec<Branch<'a, E>>,
    current: usize,
}

impl<'a, E> ExhaustMerge<'a, E> {
    pub fn new(inputs: Vec<Branch<'a, E>>) -> Self {
        ExhaustMerge { inputs, current: 0 }
    }
}

impl<'a, E> Iterator for ExhaustMerge<'a, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        while let Some(input) = self.inputs.get_mut(self.current) {
            if let Some(item) = input.next() {
                return Some(item);
            }
            self.current += 1;
        }
        None
    }
}

struct Split<'a, S> {
    input: Source<'a, S>,
    buffers: Vec<VecDeque<S>>,
}

/// One branch's view of the shared input: items pulled by a sibling wait in
/// this branch's buffer until it asks for them.
struct BranchFeed<'a, S> {
    split: Rc<RefCell<Split<'a, S>>>,
    branch: usize,
}

impl<'a, S: Clone> Iterator for BranchFeed<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        let mut split = self.split.borrow_mut();
        if let Some(item) = split.buffers[self.branch].pop_front() {
            return Some(item);
        }
        let item = split.input.pull()?;
        for (index, buffer) in split.buffers.iter_mut().enumerate() {
            if index != self.branch {
                buffer.push_back(item.clone());
            }
        }
        Some(item)
    }
}

/// Copies every input item into each branch and merges the branch outputs
pub struct CopySplitPipe<'a, S, E> {
    split: Rc<RefCell<Split<'a, S>>>,
    merged: Branch<'a, E>,
}

impl<'a, S: Clone + 'a, E: 'a> CopySplitPipe<'a, S, E> {
    pub fn new(
        branches: Vec<Box<dyn Pipe<'a, Start = S, Item = E> + 'a>>,
        mode: MergeMode,
    ) -> GraphResult<Self> {
        if branches.is_empty() {
            return Err(GraphError::InvalidArgument(
                "copy-split needs at least one branch".to_string(),
            ));
        }
        let split = Rc::new(RefCell::new(Split {
            input: Source::new(),
            buffers: (0..branches.len()).map(|_| VecDeque::new()).collect(),
        }));

        let mut outputs: Vec<Branch<'a, E>> = Vec::with_capacity(branches.len());
        for (branch, mut pipe) in branches.into_iter().enumerate() {
            pipe.set_starts(Box::new(BranchFeed {
                split: split.clone(),
                branch,
            }))?;
            outputs.push(Box::new(pipe));
        }

        let merged: Branch<'a, E> = match mode {
            MergeMode::Fair => Box::new(FairMerge::new(outputs)),
            MergeMode::Exhaustive => Box::new(ExhaustMerge::new(outputs)),
        };
        Ok(CopySplitPipe { split, merged })
    }
}

impl<'a, S, E> Iterator for CopySplitPipe<'a, S, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.merged.next()
    }
}

impl<'a, S, E> Pipe<'a> for CopySplitPipe<'a, S, E> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.split.borrow_mut().input.set(starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipes::{FilterFunctionPipe, FunctionPipe};

    fn branches<'a>() -> Vec<Box<dyn Pipe<'a, Start = i32, Item = i32> + 'a>> {
        vec![
            Box::new(FunctionPipe::new(|n: i32| n * 10)),
            Box::new(FilterFunctionPipe::new(|n: &i32| n % 2 == 1)),
        ]
    }

    #[test]
    fn test_fair_merge_interleaves() {
        let merge = FairMerge::new(vec![
            Box::new(vec![1, 2, 3].into_iter()),
            Box::new(vec![10].into_iter()),
            Box::new(vec![100, 200].into_iter()),
        ]);
        assert_eq!(merge.collect::<Vec<_>>(), vec![1, 10, 100, 2, 200, 3]);
    }

    #[test]
    fn test_exhaust_merge_drains_in_order() {
        let merge = ExhaustMerge::new(vec![
            Box::new(Vec::<i32>::new().into_iter()),
            Box::new(vec![1, 2].into_iter()),
            Box::new(vec![3].into_iter()),
        ]);
        assert_eq!(merge.collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_copy_split_fair() {
        let mut split = CopySplitPipe::new(branches(), MergeMode::Fair).unwrap();
        split.set_starts(Box::new(1..=3)).unwrap();
        assert_eq!(split.collect::<Vec<_>>(), vec![10, 1, 20, 3, 30]);
    }

    #[test]
    fn test_copy_split_exhaustive() {
        let mut split = CopySplitPipe::new(branches(), MergeMode::Exhaustive).unwrap();
        split.set_starts(Box::new(1..=3)).unwrap();
        assert_eq!(split.collect::<Vec<_>>(), vec![10, 20, 30, 1, 3]);
    }

    #[test]
    fn test_copy_split_requires_branches() {
        let result = CopySplitPipe::<i32, i32>::new(Vec::new(), MergeMode::Fair);
        assert!(matches!(result, Err(GraphError::InvalidArgument(_))));
    }
}
