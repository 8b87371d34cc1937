//! N-ary relationship support (hyper-edges)
//!
//! A hyper-edge connects a non-empty set of out-vertices to a non-empty set
//! of in-vertices under one label.

use super::element::Element;
use super::property::{PropertyBag, PropertyValue};
use super::types::{ElementId, HyperEdgeId, Label, RevisionId, VertexId};
use crate::error::GraphResult;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Hyper-edge connecting multiple vertices on both sides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperEdge {
    pub(crate) id: HyperEdgeId,
    pub(crate) revision: RevisionId,
    pub(crate) label: Label,
    pub(crate) properties: PropertyBag,
    pub(crate) out_vertices: IndexSet<VertexId>,
    pub(crate) in_vertices: IndexSet<VertexId>,
}

impl HyperEdge {
    pub(crate) fn new(
        id: HyperEdgeId,
        out_vertices: IndexSet<VertexId>,
        label: Label,
        in_vertices: IndexSet<VertexId>,
        properties: PropertyBag,
    ) -> Self {
        HyperEdge {
            id,
            revision: RevisionId(0),
            label,
            properties,
            out_vertices,
            in_vertices,
        }
    }

    pub fn id(&self) -> HyperEdgeId {
        self.id
    }

    pub fn out_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.out_vertices.iter().copied()
    }

    pub fn in_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.in_vertices.iter().copied()
    }

    /// Number of distinct vertices on either side
    pub fn order(&self) -> usize {
        self.out_vertices.union(&self.in_vertices).count()
    }

    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.out_vertices.contains(&vertex) || self.in_vertices.contains(&vertex)
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

impl Element for HyperEdge {
    fn element_id(&self) -> ElementId {
        ElementId::HyperEdge(self.id)
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

impl PartialEq for HyperEdge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HyperEdge {}
