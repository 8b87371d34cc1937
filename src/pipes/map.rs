//! Map stages: transform each item 1:1

use super::{Pipe, Source, Starts};
use crate::error::GraphResult;
use crate::graph::{Element, ElementId, Label, PropertyMap, PropertyValue};
use std::marker::PhantomData;

/// Emits the identifier of each element
pub struct IdPipe<'a, E: ?Sized> {
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> IdPipe<'a, E> {
    pub fn new() -> Self {
        IdPipe {
            input: Source::new(),
        }
    }
}

impl<'a, E: Element + ?Sized> Default for IdPipe<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E: Element + ?Sized> Iterator for IdPipe<'a, E> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        self.input.pull().map(Element::element_id)
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for IdPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Emits the label of each element
pub struct LabelPipe<'a, E: ?Sized> {
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> LabelPipe<'a, E> {
    pub fn new() -> Self {
        LabelPipe {
            input: Source::new(),
        }
    }
}

impl<'a, E: Element + ?Sized> Default for LabelPipe<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E: Element + ?Sized> Iterator for LabelPipe<'a, E> {
    type Item = &'a Label;

    fn next(&mut self) -> Option<&'a Label> {
        self.input.pull().map(Element::label)
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for LabelPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Emits the value of one property of each element (`Null` when absent).
/// Reserved keys are served too.
pub struct PropertyPipe<'a, E: ?Sized> {
    key: String,
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> PropertyPipe<'a, E> {
    pub fn new(key: impl Into<String>) -> Self {
        PropertyPipe {
            key: key.into(),
            input: Source::new(),
        }
    }
}

impl<'a, E: Element + ?Sized> Iterator for PropertyPipe<'a, E> {
    type Item = PropertyValue;

    fn next(&mut self) -> Option<PropertyValue> {
        let element = self.input.pull()?;
        Some(
            element
                .try_property(&self.key)
                .map(|v| v.into_owned())
                .unwrap_or(PropertyValue::Null),
        )
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for PropertyPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Emits a copy of each element's stored properties
pub struct PropertyMapPipe<'a, E: ?Sized> {
    input: Source<'a, &'a E>,
}

impl<'a, E: Element + ?Sized> PropertyMapPipe<'a, E> {
    pub fn new() -> Self {
        PropertyMapPipe {
            input: Source::new(),
        }
    }
}

impl<'a, E: Element + ?Sized> Default for PropertyMapPipe<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E: Element + ?Sized> Iterator for PropertyMapPipe<'a, E> {
    type Item = PropertyMap;

    fn next(&mut self) -> Option<PropertyMap> {
        self.input.pull().map(|e| e.properties().to_map())
    }
}

impl<'a, E: Element + ?Sized> Pipe<'a> for PropertyMapPipe<'a, E> {
    type Start = &'a E;

    fn set_starts(&mut self, starts: Starts<'a, &'a E>) -> GraphResult<()> {
        self.input.set(starts)
    }
}

/// Applies a function to each item
pub struct FunctionPipe<'a, S, T, F> {
    function: F,
    input: Source<'a, S>,
    _output: PhantomData<fn() -> T>,
}

impl<'a, S, T, F> FunctionPipe<'a, S, T, F>
where
    F: FnMut(S) -> T,
{
    pub fn new(function: F) -> Self {
        FunctionPipe {
            function,
            input: Source::new(),
            _output: PhantomData,
        }
    }
}

impl<'a, S, T, F> Iterator for FunctionPipe<'a, S, T, F>
where
    F: FnMut(S) -> T,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.input.pull()?;
        Some((self.function)(item))
    }
}

impl<'a, S, T, F> Pipe<'a> for FunctionPipe<'a, S, T, F>
where
    F: FnMut(S) -> T,
{
    type Start = S;

    fn set_starts(&mut self, starts: Starts<'a, S>) -> GraphResult<()> {
        self.input.set(starts)
    }
}
