//! Registry of vertex and edge indices
//!
//! Handles creation, deletion and lookup of indices, and fans graph mutations
//! out to every index of the affected element kind.

use super::property_index::{ElementFilter, Index, IndexEntry, IndexKeyFn, IndexedElement};
use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, EdgeId, Vertex, VertexId};
use indexmap::IndexMap;

/// Entries a removed element held in each index, by index name
pub(crate) type RemovedEntries = Vec<(String, Vec<IndexEntry>)>;

/// Manager for all indices of one graph
#[derive(Debug, Default)]
pub struct IndexManager {
    vertex_indices: IndexMap<String, Index<Vertex>>,
    edge_indices: IndexMap<String, Index<Edge>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_index(&self, name: &str) -> Option<&Index<Vertex>> {
        self.vertex_indices.get(name)
    }

    pub fn edge_index(&self, name: &str) -> Option<&Index<Edge>> {
        self.edge_indices.get(name)
    }

    pub fn vertex_indices(&self) -> impl Iterator<Item = &Index<Vertex>> + '_ {
        self.vertex_indices.values()
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = &Index<Edge>> + '_ {
        self.edge_indices.values()
    }

    pub fn has_vertex_index(&self, name: &str) -> bool {
        self.vertex_indices.contains_key(name)
    }

    pub fn has_edge_index(&self, name: &str) -> bool {
        self.edge_indices.contains_key(name)
    }

    pub(crate) fn add_vertex_index(&mut self, index: Index<Vertex>) -> GraphResult<()> {
        insert_index(&mut self.vertex_indices, index)
    }

    pub(crate) fn add_edge_index(&mut self, index: Index<Edge>) -> GraphResult<()> {
        insert_index(&mut self.edge_indices, index)
    }

    pub(crate) fn drop_vertex_index(&mut self, name: &str) -> GraphResult<Index<Vertex>> {
        remove_index(&mut self.vertex_indices, name)
    }

    pub(crate) fn drop_edge_index(&mut self, name: &str) -> GraphResult<Index<Edge>> {
        remove_index(&mut self.edge_indices, name)
    }

    pub(crate) fn vertex_index_mut(&mut self, name: &str) -> GraphResult<&mut Index<Vertex>> {
        lookup_mut(&mut self.vertex_indices, name)
    }

    pub(crate) fn edge_index_mut(&mut self, name: &str) -> GraphResult<&mut Index<Edge>> {
        lookup_mut(&mut self.edge_indices, name)
    }

    // ============================================================
    // Mutation hooks
    // ============================================================

    pub(crate) fn on_vertex_added(&mut self, vertex: &Vertex) {
        for index in self.vertex_indices.values_mut() {
            index.index_element(vertex);
        }
    }

    pub(crate) fn on_vertex_changed(&mut self, vertex: &Vertex) {
        for index in self.vertex_indices.values_mut() {
            index.reindex_element(vertex);
        }
    }

    pub(crate) fn on_vertex_removed(&mut self, id: VertexId) -> RemovedEntries {
        remove_from_all(&mut self.vertex_indices, id)
    }

    pub(crate) fn on_edge_added(&mut self, edge: &Edge) {
        for index in self.edge_indices.values_mut() {
            index.index_element(edge);
        }
    }

    pub(crate) fn on_edge_changed(&mut self, edge: &Edge) {
        for index in self.edge_indices.values_mut() {
            index.reindex_element(edge);
        }
    }

    pub(crate) fn on_edge_removed(&mut self, id: EdgeId) -> RemovedEntries {
        remove_from_all(&mut self.edge_indices, id)
    }

    /// Put back manual entries captured by `on_*_removed` (rollback)
    pub(crate) fn restore_vertex_entries(&mut self, id: VertexId, removed: RemovedEntries) {
        restore_entries(&mut self.vertex_indices, id, removed)
    }

    pub(crate) fn restore_edge_entries(&mut self, id: EdgeId, removed: RemovedEntries) {
        restore_entries(&mut self.edge_indices, id, removed)
    }
}

/// Build an automatic index and back-fill it from the existing elements
pub(crate) fn build_automatic<'a, T, I>(
    name: &str,
    key_fn: IndexKeyFn<T>,
    filter: Option<ElementFilter<T>>,
    existing: I,
) -> Index<T>
where
    T: IndexedElement + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut index = Index::automatic(name, key_fn, filter);
    for element in existing {
        index.index_element(element);
    }
    index
}

fn insert_index<T: IndexedElement>(
    indices: &mut IndexMap<String, Index<T>>,
    index: Index<T>,
) -> GraphResult<()> {
    if indices.contains_key(index.name()) {
        return Err(GraphError::DuplicateIndex {
            kind: T::KIND,
            name: index.name().to_string(),
        });
    }
    indices.insert(index.name().to_string(), index);
    Ok(())
}

fn remove_index<T: IndexedElement>(
    indices: &mut IndexMap<String, Index<T>>,
    name: &str,
) -> GraphResult<Index<T>> {
    indices
        .shift_remove(name)
        .ok_or_else(|| GraphError::not_found(T::KIND, format!("index '{}'", name)))
}

fn lookup_mut<'a, T: IndexedElement>(
    indices: &'a mut IndexMap<String, Index<T>>,
    name: &str,
) -> GraphResult<&'a mut Index<T>> {
    indices
        .get_mut(name)
        .ok_or_else(|| GraphError::not_found(T::KIND, format!("index '{}'", name)))
}

fn remove_from_all<T: IndexedElement>(
    indices: &mut IndexMap<String, Index<T>>,
    id: T::Id,
) -> RemovedEntries {
    indices
        .values_mut()
        .filter_map(|index| {
            let entries = index.remove_element(id);
            (!entries.is_empty() && !index.is_automatic())
                .then(|| (index.name().to_string(), entries))
        })
        .collect()
}

fn restore_entries<T: IndexedElement>(
    indices: &mut IndexMap<String, Index<T>>,
    id: T::Id,
    removed: RemovedEntries,
) {
    for (name, entries) in removed {
        if let Some(index) = indices.get_mut(&name) {
            for (key, value) in entries {
                index.put(key, value, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Label, PropertyBag, PropertyValue};
    use crate::index::property_keys;

    fn vertex(id: u64, name: &str) -> Vertex {
        let mut bag = PropertyBag::new();
        bag.set("name", name).unwrap();
        Vertex::new(VertexId::new(id), Label::new("person"), bag)
    }

    #[test]
    fn test_duplicate_index_name_rejected() {
        let mut manager = IndexManager::new();
        manager.add_vertex_index(Index::manual("people")).unwrap();
        let err = manager.add_vertex_index(Index::manual("people")).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIndex { .. }));

        // Namespaces are per kind
        manager.add_edge_index(Index::manual("people")).unwrap();
    }

    #[test]
    fn test_build_automatic_backfills() {
        let existing = vec![vertex(1, "Alice"), vertex(2, "Bob")];
        let index = build_automatic("by-name", property_keys(["name"]), None, existing.iter());
        assert_eq!(index.count("name", &PropertyValue::from("Bob")), 1);
    }

    #[test]
    fn test_removal_reports_only_manual_entries() {
        let mut manager = IndexManager::new();
        let alice = vertex(1, "Alice");
        manager
            .add_vertex_index(build_automatic("auto", property_keys(["name"]), None, [&alice]))
            .unwrap();
        manager.add_vertex_index(Index::manual("manual")).unwrap();
        manager
            .vertex_index_mut("manual")
            .unwrap()
            .put("tag".to_string(), "vip".into(), alice.id());

        let removed = manager.on_vertex_removed(alice.id());
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, "manual");
        assert!(manager.vertex_index("auto").unwrap().is_empty());

        manager.restore_vertex_entries(alice.id(), removed);
        assert_eq!(
            manager.vertex_index("manual").unwrap().count("tag", &"vip".into()),
            1
        );
    }

    #[test]
    fn test_drop_missing_index() {
        let mut manager = IndexManager::new();
        assert!(manager.drop_edge_index("nope").is_err());
    }
}
