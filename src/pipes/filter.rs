//! Filter stages: emit the current item unchanged iff a condition holds

use super::{Pipe, Source, Starts};
use crate::error::{GraphError, GraphResult};
use crate::graph::{Element, ElementId, Label, PropertyValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::hash::Hash;

/// Comparison applied by the comparison-based filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonFilter {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonFilter {
    /// Whether `left <op> right` holds. Values of incomparable types only
    /// satisfy `NotEqual`.
    pub fn compare(self, left: &PropertyValue, right: &PropertyValue) -> bool {
        match (self, left.compare(right)) {
            (ComparisonFilter::NotEqual, ordering) => ordering != Some(Ordering::Equal),
            (_, None) => false,
            (ComparisonFilter::Equal, Some(o)) => o == Ordering::Equal,
            (ComparisonFilter::GreaterThan, Some(o)) => o == Ordering::Greater,
            (ComparisonFilter::GreaterThanOrEqual, Some(o)) => o != Ordering::Less,
            (ComparisonFilter::LessThan, Some(o)) => o == Ordering::Less,
            (ComparisonFilter::LessThanOrEqual, Some(o)) => o != Ordering::Greater,
        }
    }

    /// Only `Equal` and `NotEqual` are meaningful for membership-style filters
    fn require_equality(self) -> GraphResult<Self> {
        match self {
            ComparisonFilter::Equal | ComparisonFilter::NotEqual => Ok(self),
            other => Err(GraphError::InvalidArgument(format!(
                "filter only supports Equal and NotEqual, got {:?}",
                other
            ))),
        }
    }

    fn keep(self, matched: bool) -> bool {
        match self {
            ComparisonFilter::NotEqual => !matched,
            _ => matched,
        }
    }
}

/// Keeps items accepted by a predicate
pub struct FilterFunctionPipe<'a, S, F> {
    predicate: F,
    input: Source<'a, S>,
}

impl<'a, S, F> FilterFunctionPipe<'a, S, F>
where
    F: FnMut(&S) -> bool,
{
    pub fn new(predicate: F) -> Self {
        FilterFunctionPipe {
            predicate,
            input: Source::new(),
        }
    }
}

impl<'a, S, F> Iterator for FilterFunctionPipe<'a, S, F>
where
    F: FnMut(&S) -> bool,
{
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            let item = self.input.pull()?;
            if (self.predicate)(&item) {
                return Some(item);
            }
        }
    }
}

impl<'a, S, F> Pipe<'a> for FilterFunctionPipe<'a, S, F>
where
    F: FnMut(&S) -> bool,
{
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Keeps elements whose label is (Equal) or is not (NotEqual) one of `labels`
pub struct LabelFilterPipe<'a, E: ?Sized> {
    labels: Vec<Label>,
    filter: ComparisonFilter,
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> LabelFilterPipe<'a, E> {
    pub fn new(labels: Vec<Label>, filter: ComparisonFilter) -> GraphResult<Self> {
        Ok(LabelFilterPipe {
            labels,
            filter: filter.require_equality()?,
            input: Source::new(),
        })
    }
}

impl<'a, E: Element + ?Sized> Iterator for LabelFilterPipe<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        loop {
            let element = self.input.pull()?;
            let matched = self.labels.iter().any(|l| l == element.label());
            if self.filter.keep(matched) {
                return Some(element);
            }
        }
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for LabelFilterPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Keeps elements whose id is (Equal) or is not (NotEqual) one of `ids`
pub struct IdFilterPipe<'a, E: ?Sized> {
    ids: FxHashSet<ElementId>,
    filter: ComparisonFilter,
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> IdFilterPipe<'a, E> {
    pub fn new<I>(ids: I, filter: ComparisonFilter) -> GraphResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<ElementId>,
    {
        Ok(IdFilterPipe {
            ids: ids.into_iter().map(Into::into).collect(),
            filter: filter.require_equality()?,
            input: Source::new(),
        })
    }
}

impl<'a, E: Element + ?Sized> Iterator for IdFilterPipe<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        loop {
            let element = self.input.pull()?;
            if self.filter.keep(self.ids.contains(&element.element_id())) {
                return Some(element);
            }
        }
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for IdFilterPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Keeps elements whose property `key` compares to `value` under `filter`.
/// Elements without the property are dropped.
pub struct PropertyFilterPipe<'a, E: ?Sized> {
    key: String,
    value: PropertyValue,
    filter: ComparisonFilter,
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> PropertyFilterPipe<'a, E> {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
        filter: ComparisonFilter,
    ) -> Self {
        PropertyFilterPipe {
            key: key.into(),
            value: value.into(),
            filter,
            input: Source::new(),
        }
    }
}

impl<'a, E: Element + ?Sized> Iterator for PropertyFilterPipe<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        loop {
            let element = self.input.pull()?;
            let keep = element
                .try_property(&self.key)
                .map_or(false, |v| self.filter.compare(&v, &self.value));
            if keep {
                return Some(element);
            }
        }
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for PropertyFilterPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Keeps items equal (or not equal) to one object
pub struct ObjectFilterPipe<'a, S> {
    object: S,
    filter: ComparisonFilter,
    input: Source<'a, S>,
}

impl<'a, S: PartialEq> ObjectFilterPipe<'a, S> {
    pub fn new(object: S, filter: ComparisonFilter) -> GraphResult<Self> {
        Ok(ObjectFilterPipe {
            object,
            filter: filter.require_equality()?,
            input: Source::new(),
        })
    }
}

impl<'a, S: PartialEq> Iterator for ObjectFilterPipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            let item = self.input.pull()?;
            if self.filter.keep(item == self.object) {
                return Some(item);
            }
        }
    }
}

impl<'a, S: PartialEq> Pipe<'a> for ObjectFilterPipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Keeps items that are (Equal) or are not (NotEqual) members of a collection
pub struct CollectionFilterPipe<'a, S> {
    collection: FxHashSet<S>,
    filter: ComparisonFilter,
    input: Source<'a, S>,
}

impl<'a, S: Eq + Hash> CollectionFilterPipe<'a, S> {
    pub fn new(collection: impl IntoIterator<Item = S>, filter: ComparisonFilter) -> GraphResult<Self> {
        Ok(CollectionFilterPipe {
            collection: collection.into_iter().collect(),
            filter: filter.require_equality()?,
            input: Source::new(),
        })
    }
}

impl<'a, S: Eq + Hash> Iterator for CollectionFilterPipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            let item = self.input.pull()?;
            if self.filter.keep(self.collection.contains(&item)) {
                return Some(item);
            }
        }
    }
}

impl<'a, S: Eq + Hash> Pipe<'a> for CollectionFilterPipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Emits each distinct item once
pub struct DuplicateFilterPipe<'a, S> {
    seen: FxHashSet<S>,
    input: Source<'a, S>,
}

impl<'a, S: Eq + Hash + Clone> DuplicateFilterPipe<'a, S> {
    pub fn new() -> Self {
        DuplicateFilterPipe {
            seen: FxHashSet::default(),
            input: Source::new(),
        }
    }
}

impl<'a, S: Eq + Hash + Clone> Default for DuplicateFilterPipe<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: Eq + Hash + Clone> Iterator for DuplicateFilterPipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            let item = self.input.pull()?;
            if self.seen.insert(item.clone()) {
                return Some(item);
            }
        }
    }
}

impl<'a, S: Eq + Hash + Clone> Pipe<'a> for DuplicateFilterPipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Suppresses an item equal to the one emitted just before it
pub struct UniqueConsecutivePipe<'a, S> {
    previous: Option<S>,
    input: Source<'a, S>,
}

impl<'a, S: PartialEq + Clone> UniqueConsecutivePipe<'a, S> {
    pub fn new() -> Self {
        UniqueConsecutivePipe {
            previous: None,
            input: Source::new(),
        }
    }
}

impl<'a, S: PartialEq + Clone> Default for UniqueConsecutivePipe<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: PartialEq + Clone> Iterator for UniqueConsecutivePipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            let item = self.input.pull()?;
            if self.previous.as_ref() != Some(&item) {
                self.previous = Some(item.clone());
                return Some(item);
            }
        }
    }
}

impl<'a, S: PartialEq + Clone> Pipe<'a> for UniqueConsecutivePipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Emits the items at positions `low..high` (zero-based, `high` exclusive,
/// unbounded when `None`). Stops pulling once past `high`.
pub struct RangeFilterPipe<'a, S> {
    low: usize,
    high: Option<usize>,
    position: usize,
    input: Source<'a, S>,
}

impl<'a, S> RangeFilterPipe<'a, S> {
    pub fn new(low: usize, high: Option<usize>) -> GraphResult<Self> {
        if matches!(high, Some(high) if high < low) {
            return Err(GraphError::InvalidArgument(format!(
                "range upper bound {:?} is below lower bound {}",
                high, low
            )));
        }
        Ok(RangeFilterPipe {
            low,
            high,
            position: 0,
            input: Source::new(),
        })
    }
}

impl<'a, S> Iterator for RangeFilterPipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            if self.high.map_or(false, |high| self.position >= high) {
                return None;
            }
            let item = self.input.pull()?;
            let position = self.position;
            self.position += 1;
            if position >= self.low {
                return Some(item);
            }
        }
    }
}

impl<'a, S> Pipe<'a> for RangeFilterPipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Keeps each item with probability `bias`
pub struct RandomFilterPipe<'a, S> {
    bias: f64,
    rng: StdRng,
    input: Source<'a, S>,
}

impl<'a, S> RandomFilterPipe<'a, S> {
    pub fn new(bias: f64) -> GraphResult<Self> {
        Self::with_rng(bias, StdRng::from_entropy())
    }

    /// Deterministic sampling for reproducible traversals
    pub fn with_seed(bias: f64, seed: u64) -> GraphResult<Self> {
        Self::with_rng(bias, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bias: f64, rng: StdRng) -> GraphResult<Self> {
        if !(0.0..=1.0).contains(&bias) {
            return Err(GraphError::InvalidArgument(format!(
                "bias must be within [0, 1], got {}",
                bias
            )));
        }
        Ok(RandomFilterPipe {
            bias,
            rng,
            input: Source::new(),
        })
    }
}

impl<'a, S> Iterator for RandomFilterPipe<'a, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        loop {
            let item = self.input.pull()?;
            if self.rng.gen_bool(self.bias) {
                return Some(item);
            }
        }
    }
}

impl<'a, S> Pipe<'a> for RandomFilterPipe<'a, S> {
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{PropertyGraph, Vertex};

    fn run<'a, P>(mut pipe: P, items: Vec<P::Start>) -> Vec<P::Item>
    where
        P: Pipe<'a>,
        P::Start: 'a,
    {
        pipe.set_starts(Box::new(items.into_iter())).unwrap();
        pipe.collect()
    }

    #[test]
    fn test_comparison_filter() {
        let five = PropertyValue::Integer(5);
        assert!(ComparisonFilter::GreaterThan.compare(&PropertyValue::Float(5.5), &five));
        assert!(ComparisonFilter::LessThanOrEqual.compare(&five, &five));
        assert!(!ComparisonFilter::Equal.compare(&"5".into(), &five));
        assert!(ComparisonFilter::NotEqual.compare(&"5".into(), &five));
    }

    #[test]
    fn test_collection_filter_modes() {
        let keep = CollectionFilterPipe::new(vec![1, 3], ComparisonFilter::Equal).unwrap();
        assert_eq!(run(keep, vec![1, 2, 3, 4]), vec![1, 3]);

        let drop = CollectionFilterPipe::new(vec![1, 3], ComparisonFilter::NotEqual).unwrap();
        assert_eq!(run(drop, vec![1, 2, 3, 4]), vec![2, 4]);

        let err = CollectionFilterPipe::new(vec![1], ComparisonFilter::GreaterThan)
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
    }

    #[test]
    fn test_object_filter() {
        let pipe = ObjectFilterPipe::new("b", ComparisonFilter::NotEqual).unwrap();
        assert_eq!(run(pipe, vec!["a", "b", "c"]), vec!["a", "c"]);
        assert!(ObjectFilterPipe::new("b", ComparisonFilter::LessThan).is_err());
    }

    #[test]
    fn test_duplicate_and_consecutive_filters() {
        assert_eq!(run(DuplicateFilterPipe::new(), vec![1, 2, 1, 3, 2]), vec![1, 2, 3]);
        assert_eq!(
            run(UniqueConsecutivePipe::new(), vec![1, 1, 2, 2, 1, 3, 3]),
            vec![1, 2, 1, 3]
        );
    }

    #[test]
    fn test_range_filter() {
        let pipe = RangeFilterPipe::new(1, Some(3)).unwrap();
        assert_eq!(run(pipe, vec!['a', 'b', 'c', 'd']), vec!['b', 'c']);
        let open = RangeFilterPipe::new(2, None).unwrap();
        assert_eq!(run(open, vec![1, 2, 3, 4]), vec![3, 4]);
        assert!(RangeFilterPipe::<i32>::new(3, Some(1)).is_err());
    }

    #[test]
    fn test_random_filter_extremes() {
        let all = RandomFilterPipe::with_seed(1.0, 7).unwrap();
        assert_eq!(run(all, vec![1, 2, 3]), vec![1, 2, 3]);
        let none = RandomFilterPipe::with_seed(0.0, 7).unwrap();
        assert!(run(none, vec![1, 2, 3]).is_empty());
        assert!(RandomFilterPipe::<i32>::new(1.5).is_err());
    }

    #[test]
    fn test_element_filters() {
        let mut graph = PropertyGraph::new();
        let alice = graph
            .add_vertex_with(None, "person", |v| {
                v.set_property("age", 30)?;
                Ok(())
            })
            .unwrap();
        let bob = graph
            .add_vertex_with(None, "person", |v| {
                v.set_property("age", 17)?;
                Ok(())
            })
            .unwrap();
        graph.add_vertex("robot").unwrap();
        let all: Vec<&Vertex> = graph.vertices().collect();

        let adults: PropertyFilterPipe<'_, Vertex> =
            PropertyFilterPipe::new("age", 18, ComparisonFilter::GreaterThanOrEqual);
        let ids: Vec<_> = run(adults, all.clone()).iter().map(|v| v.id()).collect();
        assert_eq!(ids, vec![alice]);

        let robots: LabelFilterPipe<'_, Vertex> =
            LabelFilterPipe::new(vec![Label::new("person")], ComparisonFilter::NotEqual).unwrap();
        assert_eq!(run(robots, all.clone()).len(), 1);

        let not_bob: IdFilterPipe<'_, Vertex> =
            IdFilterPipe::new([bob], ComparisonFilter::NotEqual).unwrap();
        assert_eq!(run(not_bob, all).len(), 2);
    }
}
