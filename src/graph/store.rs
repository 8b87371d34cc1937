//! In-memory property graph
//!
//! `PropertyGraph` is the aggregate root: it owns every vertex, edge,
//! multi-edge and hyper-edge, issues identifiers and revisions, keeps
//! adjacency symmetric and indices consistent, notifies observers, and logs
//! undo operations for the active transaction.
//!
//! Elements live in insertion-ordered maps keyed by id; adjacency is stored
//! as id sets on the vertices, so removal is an explicit, checkable step.

use super::edge::Edge;
use super::element::{label_matches, Element};
use super::event::{GraphEvent, GraphObserver, ObserverId};
use super::hyper_edge::HyperEdge;
use super::ids::{IdSource, RevisionClock};
use super::multi_edge::MultiEdge;
use super::property::{is_reserved_key, PropertyBag, PropertyMap, PropertyValue};
use super::types::{
    Direction, EdgeId, ElementId, ElementKind, HyperEdgeId, Label, MultiEdgeId, RevisionId,
    VertexId,
};
use super::vertex::Vertex;
use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use crate::index::manager::{build_automatic, RemovedEntries};
use crate::index::{ElementFilter, Index, IndexKeyFn, IndexManager};
use crate::transaction::{TransactionStack, TransactionState};
use indexmap::{IndexMap, IndexSet};
use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, trace, warn};

/// Inverse of one applied mutation, replayed newest-first on rollback
#[derive(Debug)]
pub(crate) enum UndoOp {
    RemoveVertex(VertexId),
    RestoreVertex(Box<Vertex>, RemovedEntries),
    RemoveEdge(EdgeId),
    RestoreEdge(Box<Edge>, RemovedEntries),
    RemoveMultiEdge(MultiEdgeId),
    RestoreMultiEdge(Box<MultiEdge>),
    RelinkMultiEdgeInVertex(MultiEdgeId, VertexId),
    RemoveHyperEdge(HyperEdgeId),
    RestoreHyperEdge(Box<HyperEdge>),
    RestoreProperty {
        element: ElementId,
        key: String,
        value: Option<PropertyValue>,
    },
}

/// Graph statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStatistics {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub multi_edge_count: usize,
    pub hyper_edge_count: usize,
    /// Vertex label -> number of vertices
    pub vertex_labels: IndexMap<Label, usize>,
    /// Edge label -> number of edges
    pub edge_labels: IndexMap<Label, usize>,
}

/// In-memory property graph
pub struct PropertyGraph {
    config: GraphConfig,

    vertices: IndexMap<VertexId, Vertex>,
    edges: IndexMap<EdgeId, Edge>,
    multi_edges: IndexMap<MultiEdgeId, MultiEdge>,
    hyper_edges: IndexMap<HyperEdgeId, HyperEdge>,

    vertex_ids: IdSource,
    edge_ids: IdSource,
    multi_edge_ids: IdSource,
    hyper_edge_ids: IdSource,
    clock: RevisionClock,

    indices: IndexManager,

    observers: Vec<(ObserverId, Box<dyn GraphObserver>)>,
    next_observer: u64,

    transactions: TransactionStack<UndoOp>,
}

impl PropertyGraph {
    /// Create an empty graph with the default configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        let strategy = config.id_strategy;
        PropertyGraph {
            config,
            vertices: IndexMap::new(),
            edges: IndexMap::new(),
            multi_edges: IndexMap::new(),
            hyper_edges: IndexMap::new(),
            vertex_ids: IdSource::new(strategy),
            edge_ids: IdSource::new(strategy),
            multi_edge_ids: IdSource::new(strategy),
            hyper_edge_ids: IdSource::new(strategy),
            clock: RevisionClock::default(),
            indices: IndexManager::new(),
            observers: Vec::new(),
            next_observer: 1,
            transactions: TransactionStack::new(),
        }
    }

    /// Create a graph and populate it through an initializer callback
    pub fn with_initializer<F>(config: GraphConfig, init: F) -> GraphResult<Self>
    where
        F: FnOnce(&mut PropertyGraph) -> GraphResult<()>,
    {
        let mut graph = Self::with_config(config);
        init(&mut graph)?;
        debug!(
            "Initialized graph '{}' with {} vertices and {} edges",
            graph.name(),
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ============================================================
    // Vertices
    // ============================================================

    /// Add a vertex with a generated id
    pub fn add_vertex(&mut self, label: impl Into<Label>) -> GraphResult<VertexId> {
        self.add_vertex_with(None, label, |_| Ok(()))
    }

    /// Add a vertex under a caller-chosen id
    pub fn add_vertex_with_id(
        &mut self,
        id: VertexId,
        label: impl Into<Label>,
    ) -> GraphResult<VertexId> {
        self.add_vertex_with(Some(id), label, |_| Ok(()))
    }

    pub fn add_vertex_with_properties(
        &mut self,
        label: impl Into<Label>,
        properties: PropertyMap,
    ) -> GraphResult<VertexId> {
        let bag = PropertyBag::try_from(properties)?;
        self.add_vertex_with(None, label, move |v| {
            v.properties = bag;
            Ok(())
        })
    }

    /// Add a vertex, running `init` before it becomes visible to indices.
    ///
    /// Fails with `DuplicateId` when `id` is taken. A failing initializer
    /// leaves the graph unchanged.
    pub fn add_vertex_with<F>(
        &mut self,
        id: Option<VertexId>,
        label: impl Into<Label>,
        init: F,
    ) -> GraphResult<VertexId>
    where
        F: FnOnce(&mut Vertex) -> GraphResult<()>,
    {
        self.transactions.check_writable()?;
        let id = allocate_id(&mut self.vertex_ids, &self.vertices, id)?;
        let mut vertex = Vertex::new(id, label.into(), PropertyBag::new());
        init(&mut vertex)?;

        self.link_vertex(vertex, Vec::new());
        self.transactions.record(UndoOp::RemoveVertex(id));
        debug!("Added vertex {}", id);
        Ok(id)
    }

    pub fn vertex(&self, id: VertexId) -> GraphResult<&Vertex> {
        self.vertices
            .get(&id)
            .ok_or_else(|| GraphError::not_found(ElementKind::Vertex, id.as_u64()))
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Fresh lazy sequence over the live vertices
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices.values()
    }

    pub fn vertices_where<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Vertex> + 'a
    where
        P: FnMut(&&'a Vertex) -> bool + 'a,
    {
        self.vertices.values().filter(predicate)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Remove a vertex.
    ///
    /// With live adjacency the call fails with `CascadeRequired` unless
    /// `cascade` is set. Cascading is depth-one: adjacent edges, hyper-edges
    /// and multi-edges leaving the vertex are removed, and multi-edges
    /// targeting it lose that in-vertex (and disappear once none is left).
    pub fn remove_vertex(&mut self, id: VertexId, cascade: bool) -> GraphResult<Vertex> {
        self.transactions.check_writable()?;
        let adjacent = self.vertex(id)?.adjacency_count();
        if adjacent > 0 {
            if !cascade {
                return Err(GraphError::CascadeRequired {
                    kind: ElementKind::Vertex,
                    id: id.as_u64().to_string(),
                    adjacent,
                });
            }
            self.cascade_from(id);
        }
        let vertex = self
            .remove_vertex_logged(id)
            .ok_or_else(|| GraphError::not_found(ElementKind::Vertex, id.as_u64()))?;
        debug!("Removed vertex {} ({} adjacent)", id, adjacent);
        Ok(vertex)
    }

    /// Remove a vertex using the configured cascade policy
    pub fn remove_vertex_default(&mut self, id: VertexId) -> GraphResult<Vertex> {
        self.remove_vertex(id, self.config.cascade_by_default)
    }

    // ============================================================
    // Edges
    // ============================================================

    pub fn add_edge(
        &mut self,
        out_vertex: VertexId,
        label: impl Into<Label>,
        in_vertex: VertexId,
    ) -> GraphResult<EdgeId> {
        self.add_edge_with(None, out_vertex, label, in_vertex, |_| Ok(()))
    }

    pub fn add_edge_with_properties(
        &mut self,
        out_vertex: VertexId,
        label: impl Into<Label>,
        in_vertex: VertexId,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        let bag = PropertyBag::try_from(properties)?;
        self.add_edge_with(None, out_vertex, label, in_vertex, move |e| {
            e.properties = bag;
            Ok(())
        })
    }

    /// Add an edge out_vertex -[label]-> in_vertex.
    ///
    /// Both endpoints must exist in this graph (`ElementNotFound`).
    pub fn add_edge_with<F>(
        &mut self,
        id: Option<EdgeId>,
        out_vertex: VertexId,
        label: impl Into<Label>,
        in_vertex: VertexId,
        init: F,
    ) -> GraphResult<EdgeId>
    where
        F: FnOnce(&mut Edge) -> GraphResult<()>,
    {
        self.transactions.check_writable()?;
        self.vertex(out_vertex)?;
        self.vertex(in_vertex)?;
        let id = allocate_id(&mut self.edge_ids, &self.edges, id)?;
        let mut edge = Edge::new(id, out_vertex, label.into(), in_vertex, PropertyBag::new());
        init(&mut edge)?;

        self.link_edge(edge, Vec::new());
        self.transactions.record(UndoOp::RemoveEdge(id));
        debug!("Added edge {} ({} -> {})", id, out_vertex, in_vertex);
        Ok(id)
    }

    pub fn edge(&self, id: EdgeId) -> GraphResult<&Edge> {
        self.edges
            .get(&id)
            .ok_or_else(|| GraphError::not_found(ElementKind::Edge, id.as_u64()))
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    pub fn edges_where<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Edge> + 'a
    where
        P: FnMut(&&'a Edge) -> bool + 'a,
    {
        self.edges.values().filter(predicate)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        self.transactions.check_writable()?;
        let edge = self
            .remove_edge_logged(id)
            .ok_or_else(|| GraphError::not_found(ElementKind::Edge, id.as_u64()))?;
        debug!("Removed edge {}", id);
        Ok(edge)
    }

    // ============================================================
    // Multi-edges
    // ============================================================

    pub fn add_multi_edge<I>(
        &mut self,
        out_vertex: VertexId,
        label: impl Into<Label>,
        in_vertices: I,
    ) -> GraphResult<MultiEdgeId>
    where
        I: IntoIterator<Item = VertexId>,
    {
        self.add_multi_edge_with(None, out_vertex, label, in_vertices, |_| Ok(()))
    }

    /// Add a multi-edge from one vertex to one or more in-vertices
    pub fn add_multi_edge_with<I, F>(
        &mut self,
        id: Option<MultiEdgeId>,
        out_vertex: VertexId,
        label: impl Into<Label>,
        in_vertices: I,
        init: F,
    ) -> GraphResult<MultiEdgeId>
    where
        I: IntoIterator<Item = VertexId>,
        F: FnOnce(&mut MultiEdge) -> GraphResult<()>,
    {
        self.transactions.check_writable()?;
        self.vertex(out_vertex)?;
        let in_vertices = self.existing_vertex_set(in_vertices, "multi-edge in-vertices")?;
        let id = allocate_id(&mut self.multi_edge_ids, &self.multi_edges, id)?;
        let mut multi_edge =
            MultiEdge::new(id, out_vertex, label.into(), in_vertices, PropertyBag::new());
        init(&mut multi_edge)?;

        self.link_multi_edge(multi_edge);
        self.transactions.record(UndoOp::RemoveMultiEdge(id));
        debug!("Added multi-edge {} from {}", id, out_vertex);
        Ok(id)
    }

    pub fn multi_edge(&self, id: MultiEdgeId) -> GraphResult<&MultiEdge> {
        self.multi_edges
            .get(&id)
            .ok_or_else(|| GraphError::not_found(ElementKind::MultiEdge, id.as_u64()))
    }

    pub fn multi_edges(&self) -> impl Iterator<Item = &MultiEdge> + '_ {
        self.multi_edges.values()
    }

    pub fn multi_edge_count(&self) -> usize {
        self.multi_edges.len()
    }

    pub fn remove_multi_edge(&mut self, id: MultiEdgeId) -> GraphResult<MultiEdge> {
        self.transactions.check_writable()?;
        let multi_edge = self
            .remove_multi_edge_logged(id)
            .ok_or_else(|| GraphError::not_found(ElementKind::MultiEdge, id.as_u64()))?;
        debug!("Removed multi-edge {}", id);
        Ok(multi_edge)
    }

    /// Drop one in-vertex from a multi-edge.
    ///
    /// Returns `true` when that was the last in-vertex and the multi-edge
    /// itself was removed.
    pub fn remove_multi_edge_in_vertex(
        &mut self,
        id: MultiEdgeId,
        vertex: VertexId,
    ) -> GraphResult<bool> {
        self.transactions.check_writable()?;
        if !self.multi_edge(id)?.has_in_vertex(vertex) {
            return Err(GraphError::not_found(ElementKind::Vertex, vertex.as_u64()));
        }
        let removed = self.detach_in_vertex_logged(id, vertex);
        debug!("Detached {} from multi-edge {}", vertex, id);
        Ok(removed)
    }

    // ============================================================
    // Hyper-edges
    // ============================================================

    pub fn add_hyper_edge<O, I>(
        &mut self,
        out_vertices: O,
        label: impl Into<Label>,
        in_vertices: I,
    ) -> GraphResult<HyperEdgeId>
    where
        O: IntoIterator<Item = VertexId>,
        I: IntoIterator<Item = VertexId>,
    {
        self.add_hyper_edge_with(None, out_vertices, label, in_vertices, |_| Ok(()))
    }

    pub fn add_hyper_edge_with<O, I, F>(
        &mut self,
        id: Option<HyperEdgeId>,
        out_vertices: O,
        label: impl Into<Label>,
        in_vertices: I,
        init: F,
    ) -> GraphResult<HyperEdgeId>
    where
        O: IntoIterator<Item = VertexId>,
        I: IntoIterator<Item = VertexId>,
        F: FnOnce(&mut HyperEdge) -> GraphResult<()>,
    {
        self.transactions.check_writable()?;
        let out_vertices = self.existing_vertex_set(out_vertices, "hyper-edge out-vertices")?;
        let in_vertices = self.existing_vertex_set(in_vertices, "hyper-edge in-vertices")?;
        let id = allocate_id(&mut self.hyper_edge_ids, &self.hyper_edges, id)?;
        let mut hyper_edge =
            HyperEdge::new(id, out_vertices, label.into(), in_vertices, PropertyBag::new());
        init(&mut hyper_edge)?;

        self.link_hyper_edge(hyper_edge);
        self.transactions.record(UndoOp::RemoveHyperEdge(id));
        debug!("Added hyper-edge {}", id);
        Ok(id)
    }

    pub fn hyper_edge(&self, id: HyperEdgeId) -> GraphResult<&HyperEdge> {
        self.hyper_edges
            .get(&id)
            .ok_or_else(|| GraphError::not_found(ElementKind::HyperEdge, id.as_u64()))
    }

    pub fn hyper_edges(&self) -> impl Iterator<Item = &HyperEdge> + '_ {
        self.hyper_edges.values()
    }

    pub fn hyper_edge_count(&self) -> usize {
        self.hyper_edges.len()
    }

    pub fn remove_hyper_edge(&mut self, id: HyperEdgeId) -> GraphResult<HyperEdge> {
        self.transactions.check_writable()?;
        let hyper_edge = self
            .remove_hyper_edge_logged(id)
            .ok_or_else(|| GraphError::not_found(ElementKind::HyperEdge, id.as_u64()))?;
        debug!("Removed hyper-edge {}", id);
        Ok(hyper_edge)
    }

    // ============================================================
    // Adjacency
    // ============================================================

    /// Outgoing edges of a vertex, restricted to `labels` (empty = any)
    pub fn out_edges<'a>(
        &'a self,
        vertex: VertexId,
        labels: &'a [Label],
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        let vertex = self.vertex(vertex)?;
        Ok(self.resolve_edges(vertex.out_edges.iter(), labels))
    }

    pub fn in_edges<'a>(
        &'a self,
        vertex: VertexId,
        labels: &'a [Label],
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        let vertex = self.vertex(vertex)?;
        Ok(self.resolve_edges(vertex.in_edges.iter(), labels))
    }

    /// Outgoing then incoming edges; a self-loop is reported once per direction
    pub fn both_edges<'a>(
        &'a self,
        vertex: VertexId,
        labels: &'a [Label],
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        let vertex = self.vertex(vertex)?;
        Ok(self.resolve_edges(vertex.out_edges.iter().chain(vertex.in_edges.iter()), labels))
    }

    pub fn out_multi_edges<'a>(
        &'a self,
        vertex: VertexId,
        labels: &'a [Label],
    ) -> GraphResult<impl Iterator<Item = &'a MultiEdge> + 'a> {
        let vertex = self.vertex(vertex)?;
        Ok(vertex
            .out_multi_edges
            .iter()
            .filter_map(move |id| self.multi_edges.get(id))
            .filter(move |m| label_matches(labels, &m.label)))
    }

    pub fn in_multi_edges<'a>(
        &'a self,
        vertex: VertexId,
        labels: &'a [Label],
    ) -> GraphResult<impl Iterator<Item = &'a MultiEdge> + 'a> {
        let vertex = self.vertex(vertex)?;
        Ok(vertex
            .in_multi_edges
            .iter()
            .filter_map(move |id| self.multi_edges.get(id))
            .filter(move |m| label_matches(labels, &m.label)))
    }

    /// Hyper-edges touching a vertex on either side, each reported once
    pub fn hyper_edges_of<'a>(
        &'a self,
        vertex: VertexId,
        labels: &'a [Label],
    ) -> GraphResult<impl Iterator<Item = &'a HyperEdge> + 'a> {
        let vertex = self.vertex(vertex)?;
        let ids: IndexSet<HyperEdgeId> = vertex
            .out_hyper_edges
            .iter()
            .chain(vertex.in_hyper_edges.iter())
            .copied()
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(move |id| self.hyper_edges.get(&id))
            .filter(move |h| label_matches(labels, &h.label)))
    }

    pub fn out_degree(&self, vertex: VertexId, labels: &[Label]) -> GraphResult<usize> {
        Ok(self.out_edges(vertex, labels)?.count())
    }

    pub fn in_degree(&self, vertex: VertexId, labels: &[Label]) -> GraphResult<usize> {
        Ok(self.in_edges(vertex, labels)?.count())
    }

    /// Vertices reachable over one plain edge in `direction`
    pub fn neighbors<'a>(
        &'a self,
        vertex: VertexId,
        direction: Direction,
        labels: &'a [Label],
    ) -> GraphResult<Box<dyn Iterator<Item = VertexId> + 'a>> {
        Ok(match direction {
            Direction::Out => Box::new(self.out_edges(vertex, labels)?.map(Edge::in_vertex)),
            Direction::In => Box::new(self.in_edges(vertex, labels)?.map(Edge::out_vertex)),
            Direction::Both => Box::new(
                self.out_edges(vertex, labels)?
                    .map(Edge::in_vertex)
                    .chain(self.in_edges(vertex, labels)?.map(Edge::out_vertex)),
            ),
        })
    }

    fn resolve_edges<'a, I>(
        &'a self,
        ids: I,
        labels: &'a [Label],
    ) -> impl Iterator<Item = &'a Edge> + 'a
    where
        I: Iterator<Item = &'a EdgeId> + 'a,
    {
        ids.filter_map(move |id| self.edges.get(id))
            .filter(move |e| label_matches(labels, &e.label))
    }

    // ============================================================
    // Properties
    // ============================================================

    /// Any element by tagged id
    pub fn element(&self, id: ElementId) -> GraphResult<&dyn Element> {
        match id {
            ElementId::Vertex(v) => self.vertex(v).map(|e| e as &dyn Element),
            ElementId::Edge(e) => self.edge(e).map(|e| e as &dyn Element),
            ElementId::MultiEdge(m) => self.multi_edge(m).map(|e| e as &dyn Element),
            ElementId::HyperEdge(h) => self.hyper_edge(h).map(|e| e as &dyn Element),
        }
    }

    /// Set a property, returning the previous value.
    ///
    /// Raises `PropertyChanging` / `PropertyChanged` and bumps the element's revision.
    pub fn set_property(
        &mut self,
        element: impl Into<ElementId>,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        self.transactions.check_writable()?;
        let element = element.into();
        let key = key.into();
        reject_reserved(&key)?;
        let previous = self.write_property(element, &key, Some(value.into()))?;
        self.transactions.record(UndoOp::RestoreProperty {
            element,
            key,
            value: previous.clone(),
        });
        Ok(previous)
    }

    /// Remove a property, returning its value; fails for absent or reserved keys
    pub fn remove_property(
        &mut self,
        element: impl Into<ElementId>,
        key: &str,
    ) -> GraphResult<PropertyValue> {
        self.transactions.check_writable()?;
        let element = element.into();
        reject_reserved(key)?;
        if !self.element(element)?.properties().contains_key(key) {
            return Err(GraphError::KeyNotFound(key.to_string()));
        }
        let previous = self
            .write_property(element, key, None)?
            .ok_or_else(|| GraphError::KeyNotFound(key.to_string()))?;
        self.transactions.record(UndoOp::RestoreProperty {
            element,
            key: key.to_string(),
            value: Some(previous.clone()),
        });
        Ok(previous)
    }

    /// Strict read, reserved keys included
    pub fn get_property(
        &self,
        element: impl Into<ElementId>,
        key: &str,
    ) -> GraphResult<PropertyValue> {
        self.element(element.into())?
            .property(key)
            .map(Cow::into_owned)
    }

    pub fn try_get_property(
        &self,
        element: impl Into<ElementId>,
        key: &str,
    ) -> Option<PropertyValue> {
        self.element(element.into())
            .ok()?
            .try_property(key)
            .map(Cow::into_owned)
    }

    pub fn properties(&self, element: impl Into<ElementId>) -> GraphResult<&PropertyBag> {
        Ok(self.element(element.into())?.properties())
    }

    pub fn revision(&self, element: impl Into<ElementId>) -> GraphResult<RevisionId> {
        Ok(self.element(element.into())?.revision())
    }

    /// Optimistic-concurrency check: fails with `IllegalState` when the
    /// element changed since `expected` was read
    pub fn check_revision(
        &self,
        element: impl Into<ElementId>,
        expected: RevisionId,
    ) -> GraphResult<()> {
        let element = element.into();
        let current = self.element(element)?.revision();
        if current != expected {
            return Err(GraphError::IllegalState(format!(
                "{} is at {}, expected {}",
                element, current, expected
            )));
        }
        Ok(())
    }

    // ============================================================
    // Indices
    // ============================================================

    /// Create an automatic vertex index, back-filled from the current vertices
    pub fn create_vertices_index(
        &mut self,
        name: impl Into<String>,
        key_fn: IndexKeyFn<Vertex>,
        filter: Option<ElementFilter<Vertex>>,
    ) -> GraphResult<&Index<Vertex>> {
        let name = name.into();
        if self.indices.has_vertex_index(&name) {
            return Err(GraphError::DuplicateIndex {
                kind: ElementKind::Vertex,
                name,
            });
        }
        let index = build_automatic(&name, key_fn, filter, self.vertices.values());
        self.indices.add_vertex_index(index)?;
        debug!("Created automatic vertex index '{}'", name);
        self.vertices_index(&name)
    }

    pub fn create_edges_index(
        &mut self,
        name: impl Into<String>,
        key_fn: IndexKeyFn<Edge>,
        filter: Option<ElementFilter<Edge>>,
    ) -> GraphResult<&Index<Edge>> {
        let name = name.into();
        if self.indices.has_edge_index(&name) {
            return Err(GraphError::DuplicateIndex {
                kind: ElementKind::Edge,
                name,
            });
        }
        let index = build_automatic(&name, key_fn, filter, self.edges.values());
        self.indices.add_edge_index(index)?;
        debug!("Created automatic edge index '{}'", name);
        self.edges_index(&name)
    }

    /// Create an empty index filled through `put_vertex_index_entry`
    pub fn create_manual_vertices_index(
        &mut self,
        name: impl Into<String>,
    ) -> GraphResult<&Index<Vertex>> {
        let name = name.into();
        self.indices.add_vertex_index(Index::manual(name.clone()))?;
        debug!("Created manual vertex index '{}'", name);
        self.vertices_index(&name)
    }

    pub fn create_manual_edges_index(&mut self, name: impl Into<String>) -> GraphResult<&Index<Edge>> {
        let name = name.into();
        self.indices.add_edge_index(Index::manual(name.clone()))?;
        debug!("Created manual edge index '{}'", name);
        self.edges_index(&name)
    }

    pub fn drop_vertices_index(&mut self, name: &str) -> GraphResult<()> {
        self.indices.drop_vertex_index(name)?;
        debug!("Dropped vertex index '{}'", name);
        Ok(())
    }

    pub fn drop_edges_index(&mut self, name: &str) -> GraphResult<()> {
        self.indices.drop_edge_index(name)?;
        debug!("Dropped edge index '{}'", name);
        Ok(())
    }

    pub fn vertices_index(&self, name: &str) -> GraphResult<&Index<Vertex>> {
        self.indices
            .vertex_index(name)
            .ok_or_else(|| GraphError::not_found(ElementKind::Vertex, format!("index '{}'", name)))
    }

    pub fn edges_index(&self, name: &str) -> GraphResult<&Index<Edge>> {
        self.indices
            .edge_index(name)
            .ok_or_else(|| GraphError::not_found(ElementKind::Edge, format!("index '{}'", name)))
    }

    pub fn vertices_indices(&self) -> impl Iterator<Item = &Index<Vertex>> + '_ {
        self.indices.vertex_indices()
    }

    pub fn edges_indices(&self) -> impl Iterator<Item = &Index<Edge>> + '_ {
        self.indices.edge_indices()
    }

    /// File a vertex under (key, value) in a manual index
    pub fn put_vertex_index_entry(
        &mut self,
        index: &str,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
        vertex: VertexId,
    ) -> GraphResult<bool> {
        self.vertex(vertex)?;
        let index = self.indices.vertex_index_mut(index)?;
        if index.is_automatic() {
            return Err(GraphError::IllegalState(format!(
                "index '{}' is automatic and cannot be written to",
                index.name()
            )));
        }
        Ok(index.put(key.into(), value.into(), vertex))
    }

    pub fn remove_vertex_index_entry(
        &mut self,
        index: &str,
        key: &str,
        value: &PropertyValue,
        vertex: VertexId,
    ) -> GraphResult<bool> {
        let index = self.indices.vertex_index_mut(index)?;
        if index.is_automatic() {
            return Err(GraphError::IllegalState(format!(
                "index '{}' is automatic and cannot be written to",
                index.name()
            )));
        }
        Ok(index.remove(key, value, vertex))
    }

    pub fn put_edge_index_entry(
        &mut self,
        index: &str,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
        edge: EdgeId,
    ) -> GraphResult<bool> {
        self.edge(edge)?;
        let index = self.indices.edge_index_mut(index)?;
        if index.is_automatic() {
            return Err(GraphError::IllegalState(format!(
                "index '{}' is automatic and cannot be written to",
                index.name()
            )));
        }
        Ok(index.put(key.into(), value.into(), edge))
    }

    pub fn remove_edge_index_entry(
        &mut self,
        index: &str,
        key: &str,
        value: &PropertyValue,
        edge: EdgeId,
    ) -> GraphResult<bool> {
        let index = self.indices.edge_index_mut(index)?;
        if index.is_automatic() {
            return Err(GraphError::IllegalState(format!(
                "index '{}' is automatic and cannot be written to",
                index.name()
            )));
        }
        Ok(index.remove(key, value, edge))
    }

    /// Vertices filed under (key, value) in the named index
    pub fn lookup_vertices<'a>(
        &'a self,
        index: &str,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<impl Iterator<Item = &'a Vertex> + 'a> {
        let ids: Vec<VertexId> = self.vertices_index(index)?.get(key, value).collect();
        Ok(ids.into_iter().filter_map(move |id| self.vertices.get(&id)))
    }

    pub fn lookup_edges<'a>(
        &'a self,
        index: &str,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        let ids: Vec<EdgeId> = self.edges_index(index)?.get(key, value).collect();
        Ok(ids.into_iter().filter_map(move |id| self.edges.get(&id)))
    }

    // ============================================================
    // Observers
    // ============================================================

    pub fn subscribe(&mut self, observer: impl GraphObserver + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` when the observer was not subscribed
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn emit(&mut self, event: GraphEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }

    // ============================================================
    // Transactions
    // ============================================================

    pub fn begin_transaction(&mut self) -> GraphResult<()> {
        self.transactions.begin()?;
        debug!("Began transaction on graph '{}'", self.config.name);
        Ok(())
    }

    pub fn begin_nested_transaction(&mut self) -> GraphResult<()> {
        let depth = self.transactions.begin_nested()?;
        debug!("Began nested transaction at depth {}", depth);
        Ok(())
    }

    /// Commit the innermost transaction.
    ///
    /// A nested commit is provisional until the root commits. A transaction
    /// marked rollback-only by a nested rollback is rolled back instead and
    /// the call fails with `RollbackRequired`.
    pub fn commit(&mut self) -> GraphResult<()> {
        match self.transactions.prepare_commit()? {
            None => {
                self.transactions.finish();
                debug!("Committed transaction (depth {})", self.transactions.depth());
                Ok(())
            }
            Some(undo) => {
                let undone = undo.len();
                self.apply_undo(undo);
                self.transactions.finish();
                warn!(
                    "Transaction was rollback-only; undid {} operation(s) instead of committing",
                    undone
                );
                Err(GraphError::RollbackRequired)
            }
        }
    }

    /// Undo every mutation of the innermost transaction
    pub fn rollback(&mut self) -> GraphResult<()> {
        let undo = self.transactions.prepare_rollback()?;
        let undone = undo.len();
        self.apply_undo(undo);
        self.transactions.finish();
        debug!("Rolled back transaction, undid {} operation(s)", undone);
        Ok(())
    }

    /// State of the innermost open transaction; `None` in auto-commit mode
    pub fn transaction_state(&self) -> Option<TransactionState> {
        self.transactions.state()
    }

    /// How the most recently closed transaction ended
    pub fn last_transaction_outcome(&self) -> Option<TransactionState> {
        self.transactions.last_outcome()
    }

    pub fn in_transaction(&self) -> bool {
        self.transactions.is_active()
    }

    fn apply_undo(&mut self, undo: Vec<UndoOp>) {
        for op in undo.into_iter().rev() {
            match op {
                UndoOp::RemoveVertex(id) => {
                    self.unlink_vertex(id);
                }
                UndoOp::RestoreVertex(vertex, manual) => self.link_vertex(*vertex, manual),
                UndoOp::RemoveEdge(id) => {
                    self.unlink_edge(id);
                }
                UndoOp::RestoreEdge(edge, manual) => self.link_edge(*edge, manual),
                UndoOp::RemoveMultiEdge(id) => {
                    self.unlink_multi_edge(id);
                }
                UndoOp::RestoreMultiEdge(multi_edge) => self.link_multi_edge(*multi_edge),
                UndoOp::RelinkMultiEdgeInVertex(id, vertex) => self.relink_in_vertex(id, vertex),
                UndoOp::RemoveHyperEdge(id) => {
                    self.unlink_hyper_edge(id);
                }
                UndoOp::RestoreHyperEdge(hyper_edge) => self.link_hyper_edge(*hyper_edge),
                UndoOp::RestoreProperty {
                    element,
                    key,
                    value,
                } => {
                    if let Err(e) = self.write_property(element, &key, value) {
                        warn!("Could not restore property '{}' on {}: {}", key, element, e);
                    }
                }
            }
        }
    }

    // ============================================================
    // Statistics
    // ============================================================

    pub fn statistics(&self) -> GraphStatistics {
        let mut stats = GraphStatistics {
            vertex_count: self.vertices.len(),
            edge_count: self.edges.len(),
            multi_edge_count: self.multi_edges.len(),
            hyper_edge_count: self.hyper_edges.len(),
            ..GraphStatistics::default()
        };
        for vertex in self.vertices.values() {
            *stats.vertex_labels.entry(vertex.label.clone()).or_insert(0) += 1;
        }
        for edge in self.edges.values() {
            *stats.edge_labels.entry(edge.label.clone()).or_insert(0) += 1;
        }
        stats
    }

    // ============================================================
    // Internal mutation primitives
    //
    // These assume the graph is consistent (endpoints exist, removed
    // vertices have no adjacency) and never fail. Each `*_logged` variant
    // records the inverse operation for the active transaction.
    // ============================================================

    fn existing_vertex_set<I>(&self, vertices: I, what: &str) -> GraphResult<IndexSet<VertexId>>
    where
        I: IntoIterator<Item = VertexId>,
    {
        let set: IndexSet<VertexId> = vertices.into_iter().collect();
        if set.is_empty() {
            return Err(GraphError::InvalidArgument(format!("{} must not be empty", what)));
        }
        for id in &set {
            self.vertex(*id)?;
        }
        Ok(set)
    }

    fn touch_vertex(&mut self, id: VertexId) {
        if let Some(vertex) = self.vertices.get_mut(&id) {
            vertex.revision = self.clock.tick();
            self.indices.on_vertex_changed(vertex);
        }
    }

    fn write_property(
        &mut self,
        element: ElementId,
        key: &str,
        value: Option<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let old_value = self.element(element)?.properties().try_get(key).cloned();
        self.emit(GraphEvent::PropertyChanging {
            id: element,
            key: key.to_string(),
            old_value: old_value.clone(),
            new_value: value.clone(),
        });

        let revision = self.clock.tick();
        let (bag, slot) = self.parts_mut(element)?;
        bag.restore(key.to_string(), value.clone());
        *slot = revision;
        match element {
            ElementId::Vertex(id) => {
                if let Some(vertex) = self.vertices.get(&id) {
                    self.indices.on_vertex_changed(vertex);
                }
            }
            ElementId::Edge(id) => {
                if let Some(edge) = self.edges.get(&id) {
                    self.indices.on_edge_changed(edge);
                }
            }
            ElementId::MultiEdge(_) | ElementId::HyperEdge(_) => {}
        }
        trace!("Property '{}' of {} written at {}", key, element, revision);

        self.emit(GraphEvent::PropertyChanged {
            id: element,
            key: key.to_string(),
            old_value: old_value.clone(),
            new_value: value,
        });
        Ok(old_value)
    }

    fn parts_mut(&mut self, id: ElementId) -> GraphResult<(&mut PropertyBag, &mut RevisionId)> {
        let missing = || GraphError::not_found(id.kind(), id.raw());
        match id {
            ElementId::Vertex(v) => self
                .vertices
                .get_mut(&v)
                .map(|e| (&mut e.properties, &mut e.revision))
                .ok_or_else(missing),
            ElementId::Edge(e) => self
                .edges
                .get_mut(&e)
                .map(|e| (&mut e.properties, &mut e.revision))
                .ok_or_else(missing),
            ElementId::MultiEdge(m) => self
                .multi_edges
                .get_mut(&m)
                .map(|e| (&mut e.properties, &mut e.revision))
                .ok_or_else(missing),
            ElementId::HyperEdge(h) => self
                .hyper_edges
                .get_mut(&h)
                .map(|e| (&mut e.properties, &mut e.revision))
                .ok_or_else(missing),
        }
    }

    fn cascade_from(&mut self, id: VertexId) {
        let Some(vertex) = self.vertices.get(&id) else {
            return;
        };
        let edges: IndexSet<EdgeId> = vertex
            .out_edges
            .iter()
            .chain(vertex.in_edges.iter())
            .copied()
            .collect();
        let hyper_edges: IndexSet<HyperEdgeId> = vertex
            .out_hyper_edges
            .iter()
            .chain(vertex.in_hyper_edges.iter())
            .copied()
            .collect();
        let owned_multi_edges: Vec<MultiEdgeId> = vertex.out_multi_edges.iter().copied().collect();

        for edge in edges {
            self.remove_edge_logged(edge);
        }
        for hyper_edge in hyper_edges {
            self.remove_hyper_edge_logged(hyper_edge);
        }
        for multi_edge in owned_multi_edges {
            self.remove_multi_edge_logged(multi_edge);
        }
        let targeting: Vec<MultiEdgeId> = self
            .vertices
            .get(&id)
            .map(|v| v.in_multi_edges.iter().copied().collect())
            .unwrap_or_default();
        for multi_edge in targeting {
            self.detach_in_vertex_logged(multi_edge, id);
        }
    }

    // --- vertices ---

    fn link_vertex(&mut self, mut vertex: Vertex, manual: RemovedEntries) {
        let id = vertex.id;
        vertex.revision = self.clock.tick();
        self.indices.on_vertex_added(&vertex);
        self.indices.restore_vertex_entries(id, manual);
        let label = vertex.label.clone();
        self.vertices.insert(id, vertex);
        self.emit(GraphEvent::ElementAdded {
            id: id.into(),
            label,
        });
    }

    fn unlink_vertex(&mut self, id: VertexId) -> Option<(Vertex, RemovedEntries)> {
        let vertex = self.vertices.shift_remove(&id)?;
        let manual = self.indices.on_vertex_removed(id);
        self.emit(GraphEvent::ElementRemoved {
            id: id.into(),
            label: vertex.label.clone(),
        });
        Some((vertex, manual))
    }

    fn remove_vertex_logged(&mut self, id: VertexId) -> Option<Vertex> {
        let (vertex, manual) = self.unlink_vertex(id)?;
        if self.transactions.is_active() {
            self.transactions
                .record(UndoOp::RestoreVertex(Box::new(vertex.clone()), manual));
        }
        Some(vertex)
    }

    // --- edges ---

    fn link_edge(&mut self, mut edge: Edge, manual: RemovedEntries) {
        let id = edge.id;
        if let Some(v) = self.vertices.get_mut(&edge.out_vertex) {
            v.out_edges.insert(id);
        }
        if let Some(v) = self.vertices.get_mut(&edge.in_vertex) {
            v.in_edges.insert(id);
        }
        self.touch_vertex(edge.out_vertex);
        self.touch_vertex(edge.in_vertex);

        edge.revision = self.clock.tick();
        self.indices.on_edge_added(&edge);
        self.indices.restore_edge_entries(id, manual);
        let label = edge.label.clone();
        self.edges.insert(id, edge);
        self.emit(GraphEvent::ElementAdded {
            id: id.into(),
            label,
        });
    }

    fn unlink_edge(&mut self, id: EdgeId) -> Option<(Edge, RemovedEntries)> {
        let edge = self.edges.shift_remove(&id)?;
        if let Some(v) = self.vertices.get_mut(&edge.out_vertex) {
            v.out_edges.shift_remove(&id);
        }
        if let Some(v) = self.vertices.get_mut(&edge.in_vertex) {
            v.in_edges.shift_remove(&id);
        }
        self.touch_vertex(edge.out_vertex);
        self.touch_vertex(edge.in_vertex);

        let manual = self.indices.on_edge_removed(id);
        self.emit(GraphEvent::ElementRemoved {
            id: id.into(),
            label: edge.label.clone(),
        });
        Some((edge, manual))
    }

    fn remove_edge_logged(&mut self, id: EdgeId) -> Option<Edge> {
        let (edge, manual) = self.unlink_edge(id)?;
        if self.transactions.is_active() {
            self.transactions
                .record(UndoOp::RestoreEdge(Box::new(edge.clone()), manual));
        }
        Some(edge)
    }

    // --- multi-edges ---

    fn link_multi_edge(&mut self, mut multi_edge: MultiEdge) {
        let id = multi_edge.id;
        if let Some(v) = self.vertices.get_mut(&multi_edge.out_vertex) {
            v.out_multi_edges.insert(id);
        }
        for in_vertex in &multi_edge.in_vertices {
            if let Some(v) = self.vertices.get_mut(in_vertex) {
                v.in_multi_edges.insert(id);
            }
        }
        self.touch_vertex(multi_edge.out_vertex);
        for in_vertex in multi_edge.in_vertices.clone() {
            self.touch_vertex(in_vertex);
        }

        multi_edge.revision = self.clock.tick();
        let label = multi_edge.label.clone();
        self.multi_edges.insert(id, multi_edge);
        self.emit(GraphEvent::ElementAdded {
            id: id.into(),
            label,
        });
    }

    fn unlink_multi_edge(&mut self, id: MultiEdgeId) -> Option<MultiEdge> {
        let multi_edge = self.multi_edges.shift_remove(&id)?;
        if let Some(v) = self.vertices.get_mut(&multi_edge.out_vertex) {
            v.out_multi_edges.shift_remove(&id);
        }
        for in_vertex in &multi_edge.in_vertices {
            if let Some(v) = self.vertices.get_mut(in_vertex) {
                v.in_multi_edges.shift_remove(&id);
            }
        }
        self.touch_vertex(multi_edge.out_vertex);
        for in_vertex in multi_edge.in_vertices.iter().copied() {
            self.touch_vertex(in_vertex);
        }
        self.emit(GraphEvent::ElementRemoved {
            id: id.into(),
            label: multi_edge.label.clone(),
        });
        Some(multi_edge)
    }

    fn remove_multi_edge_logged(&mut self, id: MultiEdgeId) -> Option<MultiEdge> {
        let multi_edge = self.unlink_multi_edge(id)?;
        if self.transactions.is_active() {
            self.transactions
                .record(UndoOp::RestoreMultiEdge(Box::new(multi_edge.clone())));
        }
        Some(multi_edge)
    }

    /// Returns `true` when the multi-edge lost its last in-vertex and was removed
    fn detach_in_vertex_logged(&mut self, id: MultiEdgeId, vertex: VertexId) -> bool {
        let Some(remaining) = self
            .multi_edges
            .get(&id)
            .filter(|m| m.in_vertices.contains(&vertex))
            .map(|m| m.in_vertices.len())
        else {
            return false;
        };
        if remaining == 1 {
            return self.remove_multi_edge_logged(id).is_some();
        }

        let revision = self.clock.tick();
        if let Some(multi_edge) = self.multi_edges.get_mut(&id) {
            multi_edge.in_vertices.shift_remove(&vertex);
            multi_edge.revision = revision;
        }
        if let Some(v) = self.vertices.get_mut(&vertex) {
            v.in_multi_edges.shift_remove(&id);
        }
        self.touch_vertex(vertex);
        self.transactions
            .record(UndoOp::RelinkMultiEdgeInVertex(id, vertex));
        false
    }

    fn relink_in_vertex(&mut self, id: MultiEdgeId, vertex: VertexId) {
        let revision = self.clock.tick();
        if let Some(multi_edge) = self.multi_edges.get_mut(&id) {
            multi_edge.in_vertices.insert(vertex);
            multi_edge.revision = revision;
        }
        if let Some(v) = self.vertices.get_mut(&vertex) {
            v.in_multi_edges.insert(id);
        }
        self.touch_vertex(vertex);
    }

    // --- hyper-edges ---

    fn link_hyper_edge(&mut self, mut hyper_edge: HyperEdge) {
        let id = hyper_edge.id;
        for out_vertex in &hyper_edge.out_vertices {
            if let Some(v) = self.vertices.get_mut(out_vertex) {
                v.out_hyper_edges.insert(id);
            }
        }
        for in_vertex in &hyper_edge.in_vertices {
            if let Some(v) = self.vertices.get_mut(in_vertex) {
                v.in_hyper_edges.insert(id);
            }
        }
        let touched: IndexSet<VertexId> = hyper_edge
            .out_vertices
            .union(&hyper_edge.in_vertices)
            .copied()
            .collect();
        for vertex in touched {
            self.touch_vertex(vertex);
        }

        hyper_edge.revision = self.clock.tick();
        let label = hyper_edge.label.clone();
        self.hyper_edges.insert(id, hyper_edge);
        self.emit(GraphEvent::ElementAdded {
            id: id.into(),
            label,
        });
    }

    fn unlink_hyper_edge(&mut self, id: HyperEdgeId) -> Option<HyperEdge> {
        let hyper_edge = self.hyper_edges.shift_remove(&id)?;
        for out_vertex in &hyper_edge.out_vertices {
            if let Some(v) = self.vertices.get_mut(out_vertex) {
                v.out_hyper_edges.shift_remove(&id);
            }
        }
        for in_vertex in &hyper_edge.in_vertices {
            if let Some(v) = self.vertices.get_mut(in_vertex) {
                v.in_hyper_edges.shift_remove(&id);
            }
        }
        let touched: IndexSet<VertexId> = hyper_edge
            .out_vertices
            .union(&hyper_edge.in_vertices)
            .copied()
            .collect();
        for vertex in touched {
            self.touch_vertex(vertex);
        }
        self.emit(GraphEvent::ElementRemoved {
            id: id.into(),
            label: hyper_edge.label.clone(),
        });
        Some(hyper_edge)
    }

    fn remove_hyper_edge_logged(&mut self, id: HyperEdgeId) -> Option<HyperEdge> {
        let hyper_edge = self.unlink_hyper_edge(id)?;
        if self.transactions.is_active() {
            self.transactions
                .record(UndoOp::RestoreHyperEdge(Box::new(hyper_edge.clone())));
        }
        Some(hyper_edge)
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyGraph")
            .field("name", &self.config.name)
            .field("vertices", &self.vertices.len())
            .field("edges", &self.edges.len())
            .field("multi_edges", &self.multi_edges.len())
            .field("hyper_edges", &self.hyper_edges.len())
            .field("indices", &self.indices)
            .field("observers", &self.observers.len())
            .field("transaction", &self.transactions.state())
            .finish()
    }
}

/// Pick the id for a new element: the requested one if free, otherwise the
/// next generated id not already taken by a caller-supplied one.
fn allocate_id<K, T>(
    source: &mut IdSource,
    live: &IndexMap<K, T>,
    requested: Option<K>,
) -> GraphResult<K>
where
    K: Copy + Eq + Hash + From<u64> + Into<ElementId>,
{
    match requested {
        Some(id) => {
            let tagged: ElementId = id.into();
            if live.contains_key(&id) {
                return Err(GraphError::duplicate(tagged.kind(), tagged.raw()));
            }
            source.observe(tagged.raw());
            Ok(id)
        }
        None => loop {
            let candidate = K::from(source.next_id()?);
            if !live.contains_key(&candidate) {
                return Ok(candidate);
            }
        },
    }
}

fn reject_reserved(key: &str) -> GraphResult<()> {
    if is_reserved_key(key) {
        return Err(GraphError::InvalidArgument(format!(
            "property key '{}' is reserved",
            key
        )));
    }
    Ok(())
}
