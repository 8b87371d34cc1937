//! B-Tree based (key, value) -> element index
//!
//! One `Index` serves either vertices or edges. Manual indices are filled by
//! explicit `put` calls; automatic indices derive their entries from a key
//! function and are refreshed by the owning graph on every mutation.

use crate::graph::{Edge, Element, ElementKind, EdgeId, PropertyValue, Vertex, VertexId};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{Bound, RangeBounds};

/// Whether `range` can hold no value; `BTreeMap::range` panics on some of these
fn is_empty_range<R: RangeBounds<PropertyValue>>(range: &R) -> bool {
    match (range.start_bound(), range.end_bound()) {
        (
            Bound::Included(start) | Bound::Excluded(start),
            Bound::Included(end) | Bound::Excluded(end),
        ) if start > end => true,
        (Bound::Excluded(start), Bound::Excluded(end)) => start == end,
        (Bound::Included(start), Bound::Excluded(end))
        | (Bound::Excluded(start), Bound::Included(end)) => start == end,
        _ => false,
    }
}

/// Element types that can be indexed
pub trait IndexedElement: Element {
    type Id: Copy + Eq + Hash + Ord + fmt::Debug + fmt::Display;

    const KIND: ElementKind;

    fn index_id(&self) -> Self::Id;
}

impl IndexedElement for Vertex {
    type Id = VertexId;

    const KIND: ElementKind = ElementKind::Vertex;

    fn index_id(&self) -> VertexId {
        self.id
    }
}

impl IndexedElement for Edge {
    type Id = EdgeId;

    const KIND: ElementKind = ElementKind::Edge;

    fn index_id(&self) -> EdgeId {
        self.id
    }
}

/// One (key, value) pair an element is filed under
pub type IndexEntry = (String, PropertyValue);

/// Computes the entries an element is filed under in an automatic index
pub type IndexKeyFn<T> = Box<dyn Fn(&T) -> Vec<IndexEntry> + Send + Sync>;

/// Restricts which elements an automatic index considers
pub type ElementFilter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Key function that files an element under each listed property it carries
pub fn property_keys<T, I, S>(keys: I) -> IndexKeyFn<T>
where
    T: Element + 'static,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys_fn(keys.into_iter().map(Into::into).collect())
}

fn keys_fn<T: Element + 'static>(keys: Vec<String>) -> IndexKeyFn<T> {
    Box::new(move |element: &T| {
        keys.iter()
            .filter_map(|key| {
                element
                    .try_property(key)
                    .map(|value| (key.clone(), value.into_owned()))
            })
            .collect()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Manual,
    Automatic,
}

/// Index over one element kind
pub struct Index<T: IndexedElement> {
    name: String,
    mode: IndexMode,
    key_fn: Option<IndexKeyFn<T>>,
    filter: Option<ElementFilter<T>>,
    /// key -> value -> ids (insertion ordered)
    entries: BTreeMap<String, BTreeMap<PropertyValue, IndexSet<T::Id>>>,
    /// id -> entries it is filed under
    postings: FxHashMap<T::Id, Vec<IndexEntry>>,
}

impl<T: IndexedElement> Index<T> {
    pub(crate) fn manual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: IndexMode::Manual,
            key_fn: None,
            filter: None,
            entries: BTreeMap::new(),
            postings: FxHashMap::default(),
        }
    }

    pub(crate) fn automatic(
        name: impl Into<String>,
        key_fn: IndexKeyFn<T>,
        filter: Option<ElementFilter<T>>,
    ) -> Self {
        Self {
            mode: IndexMode::Automatic,
            key_fn: Some(key_fn),
            filter,
            ..Self::manual(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    pub fn is_automatic(&self) -> bool {
        self.mode == IndexMode::Automatic
    }

    /// Elements filed under (key, value), lazily
    pub fn get<'a>(&'a self, key: &str, value: &PropertyValue) -> impl Iterator<Item = T::Id> + 'a {
        self.entries
            .get(key)
            .and_then(|values| values.get(value))
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    pub fn count(&self, key: &str, value: &PropertyValue) -> usize {
        self.entries
            .get(key)
            .and_then(|values| values.get(value))
            .map_or(0, IndexSet::len)
    }

    /// Elements whose value under `key` falls within `range`.
    ///
    /// A reversed or empty range matches nothing.
    pub fn range<R>(&self, key: &str, range: R) -> Vec<T::Id>
    where
        R: RangeBounds<PropertyValue>,
    {
        let mut result = Vec::new();
        if is_empty_range(&range) {
            return result;
        }
        if let Some(values) = self.entries.get(key) {
            for (_, ids) in values.range::<PropertyValue, _>(range) {
                result.extend(ids.iter().copied());
            }
        }
        result
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.postings.contains_key(&id)
    }

    /// Entries an element is filed under
    pub fn entries_for(&self, id: T::Id) -> &[IndexEntry] {
        self.postings.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Total number of (key, value, element) entries
    pub fn len(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub(crate) fn put(&mut self, key: String, value: PropertyValue, id: T::Id) -> bool {
        let inserted = self
            .entries
            .entry(key.clone())
            .or_default()
            .entry(value.clone())
            .or_default()
            .insert(id);
        if inserted {
            self.postings.entry(id).or_default().push((key, value));
        }
        inserted
    }

    pub(crate) fn remove(&mut self, key: &str, value: &PropertyValue, id: T::Id) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(ids) = values.get_mut(value) else {
            return false;
        };
        let removed = ids.shift_remove(&id);
        if ids.is_empty() {
            values.remove(value);
        }
        if values.is_empty() {
            self.entries.remove(key);
        }
        if removed {
            if let Some(posting) = self.postings.get_mut(&id) {
                posting.retain(|(k, v)| !(k == key && v == value));
                if posting.is_empty() {
                    self.postings.remove(&id);
                }
            }
        }
        removed
    }

    /// Drop every entry of an element, returning what was removed
    pub(crate) fn remove_element(&mut self, id: T::Id) -> Vec<IndexEntry> {
        let posting = self.postings.remove(&id).unwrap_or_default();
        for (key, value) in &posting {
            if let Some(values) = self.entries.get_mut(key) {
                if let Some(ids) = values.get_mut(value) {
                    ids.shift_remove(&id);
                    if ids.is_empty() {
                        values.remove(value);
                    }
                }
                if values.is_empty() {
                    self.entries.remove(key);
                }
            }
        }
        posting
    }

    /// File an element according to the key function (automatic indices only)
    pub(crate) fn index_element(&mut self, element: &T) {
        let Some(key_fn) = &self.key_fn else {
            return;
        };
        if let Some(filter) = &self.filter {
            if !filter(element) {
                return;
            }
        }
        let entries = key_fn(element);
        let id = element.index_id();
        for (key, value) in entries {
            self.put(key, value, id);
        }
    }

    /// Recompute an element's entries after it changed (automatic indices only)
    pub(crate) fn reindex_element(&mut self, element: &T) {
        if self.is_automatic() {
            self.remove_element(element.index_id());
            self.index_element(element);
        }
    }
}

impl<T: IndexedElement> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("kind", &T::KIND)
            .field("mode", &self.mode)
            .field("filtered", &self.filter.is_some())
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Label, PropertyBag};

    fn person(id: u64, name: &str, age: i64) -> Vertex {
        let mut bag = PropertyBag::new();
        bag.set("name", name).unwrap();
        bag.set("age", age).unwrap();
        Vertex::new(VertexId::new(id), Label::new("person"), bag)
    }

    #[test]
    fn test_manual_index_ops() {
        let mut index: Index<Vertex> = Index::manual("people");
        let n1 = VertexId::new(1);
        let n2 = VertexId::new(2);
        let val = PropertyValue::Integer(100);

        index.put("score".to_string(), val.clone(), n1);
        index.put("score".to_string(), val.clone(), n2);
        assert!(!index.put("score".to_string(), val.clone(), n2));

        let results: Vec<_> = index.get("score", &val).collect();
        assert_eq!(results, vec![n1, n2]);

        assert!(index.remove("score", &val, n1));
        assert!(!index.remove("score", &val, n1));
        let results: Vec<_> = index.get("score", &val).collect();
        assert_eq!(results, vec![n2]);
        assert!(!index.contains(n1));
    }

    #[test]
    fn test_index_range() {
        let mut index: Index<Vertex> = Index::manual("ages");
        for i in 1..=10 {
            index.put("age".to_string(), PropertyValue::Integer(i), VertexId::new(i as u64));
        }

        let results = index.range("age", PropertyValue::Integer(3)..=PropertyValue::Integer(7));
        assert_eq!(results.len(), 5);
        for i in 3..=7 {
            assert!(results.contains(&VertexId::new(i)));
        }
        assert!(index.range("height", ..).is_empty());
    }

    #[test]
    fn test_index_range_reversed_or_empty() {
        let mut index: Index<Vertex> = Index::manual("ages");
        for i in 1..=10 {
            index.put("age".to_string(), PropertyValue::Integer(i), VertexId::new(i as u64));
        }

        let seven = PropertyValue::Integer(7);
        let three = PropertyValue::Integer(3);
        assert!(index.range("age", seven.clone()..=three.clone()).is_empty());
        assert!(index.range("age", seven.clone()..three.clone()).is_empty());
        assert!(index.range("age", seven.clone()..seven.clone()).is_empty());
        assert!(index
            .range::<(Bound<PropertyValue>, Bound<PropertyValue>)>(
                "age",
                (Bound::Excluded(seven.clone()), Bound::Excluded(seven.clone()))
            )
            .is_empty());
        assert_eq!(index.range("age", seven.clone()..=seven), vec![VertexId::new(7)]);
    }

    #[test]
    fn test_automatic_index_uses_key_fn_and_filter() {
        let filter: ElementFilter<Vertex> =
            Box::new(|v: &Vertex| v.property("age").map_or(false, |a| a.as_integer() >= Some(18)));
        let mut index = Index::automatic("adults", property_keys(["name"]), Some(filter));

        let alice = person(1, "Alice", 30);
        let kid = person(2, "Tim", 9);
        index.index_element(&alice);
        index.index_element(&kid);

        assert_eq!(index.count("name", &"Alice".into()), 1);
        assert_eq!(index.count("name", &"Tim".into()), 0);
        assert_eq!(
            index.entries_for(alice.id()),
            &[("name".to_string(), PropertyValue::from("Alice"))]
        );
    }

    #[test]
    fn test_reindex_replaces_stale_entries() {
        let mut index = Index::automatic("by-name", property_keys(["name"]), None);
        let mut alice = person(1, "Alice", 30);
        index.index_element(&alice);

        alice.properties.set("name", "Alicia").unwrap();
        index.reindex_element(&alice);

        assert_eq!(index.count("name", &"Alice".into()), 0);
        assert_eq!(index.count("name", &"Alicia".into()), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_element_clears_all_entries() {
        let mut index = Index::automatic("all", property_keys(["name", "age"]), None);
        let alice = person(1, "Alice", 30);
        index.index_element(&alice);
        assert_eq!(index.len(), 2);

        let removed = index.remove_element(alice.id());
        assert_eq!(removed.len(), 2);
        assert!(index.is_empty());
        assert_eq!(index.keys().count(), 0);
    }
}
