//! Multi-edges: one out-vertex fanned out to one or more in-vertices under a single label

use super::element::Element;
use super::property::{PropertyBag, PropertyValue};
use super::types::{ElementId, Label, MultiEdgeId, RevisionId, VertexId};
use crate::error::GraphResult;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A multi-edge. The in-vertex set is never empty while the multi-edge is
/// part of a graph: removing the last in-vertex removes the multi-edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiEdge {
    pub(crate) id: MultiEdgeId,
    pub(crate) revision: RevisionId,
    pub(crate) label: Label,
    pub(crate) properties: PropertyBag,
    pub(crate) out_vertex: VertexId,
    pub(crate) in_vertices: IndexSet<VertexId>,
}

impl MultiEdge {
    pub(crate) fn new(
        id: MultiEdgeId,
        out_vertex: VertexId,
        label: Label,
        in_vertices: IndexSet<VertexId>,
        properties: PropertyBag,
    ) -> Self {
        MultiEdge {
            id,
            revision: RevisionId(0),
            label,
            properties,
            out_vertex,
            in_vertices,
        }
    }

    pub fn id(&self) -> MultiEdgeId {
        self.id
    }

    pub fn out_vertex(&self) -> VertexId {
        self.out_vertex
    }

    pub fn in_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.in_vertices.iter().copied()
    }

    pub fn in_vertex_count(&self) -> usize {
        self.in_vertices.len()
    }

    pub fn has_in_vertex(&self, vertex: VertexId) -> bool {
        self.in_vertices.contains(&vertex)
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
}

impl Element for MultiEdge {
    fn element_id(&self) -> ElementId {
        ElementId::MultiEdge(self.id)
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

impl PartialEq for MultiEdge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MultiEdge {}
