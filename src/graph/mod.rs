//! Property graph data model
//!
//! This module implements:
//! - Vertices, edges, multi-edges and hyper-edges with typed ids, revisions,
//!   labels and property bags
//! - The `PropertyGraph` aggregate root enforcing referential integrity
//! - Observer notification for element and property mutations

pub mod edge;
pub mod element;
pub mod event;
pub mod hyper_edge;
pub mod ids;
pub mod multi_edge;
pub mod property;
pub mod schema;
pub mod store;
pub mod types;
pub mod vertex;

// Re-export main types
pub use edge::Edge;
pub use element::Element;
pub use event::{EventLog, GraphEvent, GraphObserver, ObserverId};
pub use hyper_edge::HyperEdge;
pub use ids::unique_timestamp;
pub use multi_edge::MultiEdge;
pub use property::{PropertyBag, PropertyMap, PropertyValue, ID_KEY, REV_ID_KEY};
pub use store::{GraphStatistics, PropertyGraph};
pub use types::{
    Direction, EdgeId, ElementId, ElementKind, HyperEdgeId, Label, MultiEdgeId, RevisionId,
    VertexId,
};
pub use vertex::Vertex;
