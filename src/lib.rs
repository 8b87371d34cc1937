//! Pipegraph
//!
//! An in-memory property graph with a lazy, composable traversal pipeline
//! and a manual/automatic indexing subsystem.
//!
//! # Architecture
//!
//! - [`graph`]: vertices, edges, multi-edges and hyper-edges with typed ids,
//!   revisions, labels and properties, owned by the [`PropertyGraph`]
//!   aggregate root that enforces referential integrity
//! - [`index`]: named property indices, maintained by hand or kept in sync
//!   with graph mutations automatically
//! - [`pipes`]: single-pass lazy stages (map, filter, branch, walk, side
//!   effect) chained into pipelines and exposed through a fluent traversal
//! - [`transaction`]: nested transactions with undo-log rollback
//!
//! ## Example Usage
//!
//! ```rust
//! use pipegraph::graph::{PropertyGraph, PropertyValue};
//!
//! let mut graph = PropertyGraph::new();
//! let alice = graph
//!     .add_vertex_with(None, "person", |v| {
//!         v.set_property("name", "Alice")?;
//!         Ok(())
//!     })
//!     .unwrap();
//! let bob = graph.add_vertex("person").unwrap();
//! graph.set_property(bob, "name", "Bob").unwrap();
//! graph.add_edge(alice, "loves", bob).unwrap();
//!
//! let names = graph
//!     .traversal()
//!     .v()
//!     .has("name", "Alice")
//!     .out_e(&["loves"])
//!     .in_v()
//!     .property("name")
//!     .to_list();
//! assert_eq!(names, vec![PropertyValue::from("Bob")]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod pipes;
pub mod transaction;

// Re-export main types for convenience
pub use config::{GraphConfig, IdStrategy};
pub use error::{ErrorKind, GraphError, GraphResult};
pub use graph::{
    Direction, Edge, EdgeId, Element, ElementId, ElementKind, GraphEvent, GraphObserver,
    HyperEdge, HyperEdgeId, Label, MultiEdge, MultiEdgeId, PropertyGraph, PropertyMap,
    PropertyValue, RevisionId, Vertex, VertexId,
};
pub use index::{Index, IndexMode};
pub use pipes::{GraphTraversal, Pipe, Pipeline};
pub use transaction::TransactionState;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
