//! Edge implementation for the property graph
//!
//! A directed, labelled edge with exactly one out-vertex and one in-vertex.
//! Multiple edges between the same pair of vertices are allowed.

use super::element::Element;
use super::property::{PropertyBag, PropertyValue};
use super::types::{EdgeId, ElementId, Label, RevisionId, VertexId};
use crate::error::GraphResult;
use serde::{Deserialize, Serialize};

/// A directed edge in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) revision: RevisionId,
    pub(crate) label: Label,
    pub(crate) properties: PropertyBag,
    /// Edge goes FROM this vertex
    pub(crate) out_vertex: VertexId,
    /// Edge goes TO this vertex
    pub(crate) in_vertex: VertexId,
}

impl Edge {
    pub(crate) fn new(
        id: EdgeId,
        out_vertex: VertexId,
        label: Label,
        in_vertex: VertexId,
        properties: PropertyBag,
    ) -> Self {
        Edge {
            id,
            revision: RevisionId(0),
            label,
            properties,
            out_vertex,
            in_vertex,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn out_vertex(&self) -> VertexId {
        self.out_vertex
    }

    pub fn in_vertex(&self) -> VertexId {
        self.in_vertex
    }

    /// Fluent setter for initializers
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<&mut Self> {
        self.properties.set(key, value)?;
        Ok(self)
    }

    /// Check if this edge connects two vertices (in either direction)
    pub fn connects(&self, v1: VertexId, v2: VertexId) -> bool {
        (self.out_vertex == v1 && self.in_vertex == v2)
            || (self.out_vertex == v2 && self.in_vertex == v1)
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint
    pub fn other_vertex(&self, vertex: VertexId) -> Option<VertexId> {
        if self.out_vertex == vertex {
            Some(self.in_vertex)
        } else if self.in_vertex == vertex {
            Some(self.out_vertex)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.out_vertex == self.in_vertex
    }
}

impl Element for Edge {
    fn element_id(&self) -> ElementId {
        ElementId::Edge(self.id)
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

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(out_v: u64, in_v: u64) -> Edge {
        Edge::new(
            EdgeId::new(1),
            VertexId::new(out_v),
            Label::new("loves"),
            VertexId::new(in_v),
            PropertyBag::new(),
        )
    }

    #[test]
    fn test_edge_endpoints() {
        let e = edge(1, 2);
        assert_eq!(e.out_vertex(), VertexId::new(1));
        assert_eq!(e.in_vertex(), VertexId::new(2));
        assert!(e.has_label("loves"));
        assert!(e.connects(VertexId::new(2), VertexId::new(1)));
        assert!(!e.connects(VertexId::new(1), VertexId::new(3)));
    }

    #[test]
    fn test_other_vertex() {
        let e = edge(1, 2);
        assert_eq!(e.other_vertex(VertexId::new(1)), Some(VertexId::new(2)));
        assert_eq!(e.other_vertex(VertexId::new(2)), Some(VertexId::new(1)));
        assert_eq!(e.other_vertex(VertexId::new(3)), None);
        assert!(edge(4, 4).is_self_loop());
    }

    #[test]
    fn test_edge_properties() {
        let mut e = edge(1, 2);
        e.set_property("since", 2010).unwrap();
        assert_eq!(e.property("since").unwrap().as_integer(), Some(2010));
        assert_eq!(e.properties().len(), 1);
    }
}
