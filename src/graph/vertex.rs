//! Vertex implementation for the property graph
//!
//! A vertex owns its label and properties; adjacency is held as id sets that
//! only the owning `PropertyGraph` mutates. Sets keep insertion order.

use super::element::Element;
use super::property::{PropertyBag, PropertyValue};
use super::types::{EdgeId, ElementId, HyperEdgeId, Label, MultiEdgeId, RevisionId, VertexId};
use crate::error::GraphResult;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A vertex in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub(crate) id: VertexId,
    pub(crate) revision: RevisionId,
    pub(crate) label: Label,
    pub(crate) properties: PropertyBag,
    pub(crate) out_edges: IndexSet<EdgeId>,
    pub(crate) in_edges: IndexSet<EdgeId>,
    pub(crate) out_multi_edges: IndexSet<MultiEdgeId>,
    pub(crate) in_multi_edges: IndexSet<MultiEdgeId>,
    pub(crate) out_hyper_edges: IndexSet<HyperEdgeId>,
    pub(crate) in_hyper_edges: IndexSet<HyperEdgeId>,
}

impl Vertex {
    pub(crate) fn new(id: VertexId, label: Label, properties: PropertyBag) -> Self {
        Vertex {
            id,
            revision: RevisionId(0),
            label,
            properties,
            out_edges: IndexSet::new(),
            in_edges: IndexSet::new(),
            out_multi_edges: IndexSet::new(),
            in_multi_edges: IndexSet::new(),
            out_hyper_edges: IndexSet::new(),
            in_hyper_edges: IndexSet::new(),
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Fluent setter for initializers; the vertex is not yet indexed while it runs.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<&mut Self> {
        self.properties.set(key, value)?;
        Ok(self)
    }

    pub fn out_edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_edges.iter().copied()
    }

    pub fn in_edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.in_edges.iter().copied()
    }

    pub fn out_multi_edge_ids(&self) -> impl Iterator<Item = MultiEdgeId> + '_ {
        self.out_multi_edges.iter().copied()
    }

    pub fn in_multi_edge_ids(&self) -> impl Iterator<Item = MultiEdgeId> + '_ {
        self.in_multi_edges.iter().copied()
    }

    pub fn out_hyper_edge_ids(&self) -> impl Iterator<Item = HyperEdgeId> + '_ {
        self.out_hyper_edges.iter().copied()
    }

    pub fn in_hyper_edge_ids(&self) -> impl Iterator<Item = HyperEdgeId> + '_ {
        self.in_hyper_edges.iter().copied()
    }

    /// Number of outgoing plain edges
    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }

    /// Number of incoming plain edges
    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    /// Count of every adjacent element of any kind (a hyper-edge touching
    /// the vertex on both sides counts twice)
    pub fn adjacency_count(&self) -> usize {
        self.out_edges.len()
            + self.in_edges.len()
            + self.out_multi_edges.len()
            + self.in_multi_edges.len()
            + self.out_hyper_edges.len()
            + self.in_hyper_edges.len()
    }
}

impl Element for Vertex {
    fn element_id(&self) -> ElementId {
        ElementId::Vertex(self.id)
    }

    fn revision(&self) -> RevisionId {
        self.revision
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn properties(&self) -> &PropertyBag {
        &self.properties
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::property::ID_KEY;

    #[test]
    fn test_vertex_properties() {
        let mut vertex = Vertex::new(VertexId::new(4), Label::new("person"), PropertyBag::new());

        vertex
            .set_property("name", "Alice")
            .unwrap()
            .set_property("age", 30i64)
            .unwrap();

        assert_eq!(vertex.property("name").unwrap().as_string(), Some("Alice"));
        assert_eq!(vertex.property("age").unwrap().as_integer(), Some(30));
        assert_eq!(vertex.property(ID_KEY).unwrap().as_integer(), Some(4));
        assert!(vertex.property("missing").is_err());
        assert_eq!(vertex.property_keys().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn test_reserved_key_cannot_be_set() {
        let mut vertex = Vertex::new(VertexId::new(1), Label::new("person"), PropertyBag::new());
        assert!(vertex.set_property(ID_KEY, 9).is_err());
    }

    #[test]
    fn test_vertex_degrees() {
        let mut vertex = Vertex::new(VertexId::new(1), Label::new("person"), PropertyBag::new());
        vertex.out_edges.insert(EdgeId::new(1));
        vertex.out_edges.insert(EdgeId::new(2));
        vertex.in_edges.insert(EdgeId::new(3));
        vertex.in_multi_edges.insert(MultiEdgeId::new(1));

        assert_eq!(vertex.out_degree(), 2);
        assert_eq!(vertex.in_degree(), 1);
        assert_eq!(vertex.adjacency_count(), 4);
        assert_eq!(vertex.out_edge_ids().collect::<Vec<_>>(), vec![EdgeId::new(1), EdgeId::new(2)]);
    }

    #[test]
    fn test_vertex_equality() {
        let v1 = Vertex::new(VertexId::new(7), Label::new("person"), PropertyBag::new());
        let v2 = Vertex::new(VertexId::new(7), Label::new("place"), PropertyBag::new());
        let v3 = Vertex::new(VertexId::new(8), Label::new("person"), PropertyBag::new());

        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
    }
}
