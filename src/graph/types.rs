//! Core type definitions for the property graph

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                $name(id)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

element_id!(
    /// Unique identifier for a vertex
    VertexId
);
element_id!(
    /// Unique identifier for an edge
    EdgeId
);
element_id!(
    /// Unique identifier for a multi-edge
    MultiEdgeId
);
element_id!(
    /// Unique identifier for a hyper-edge
    HyperEdgeId
);

/// Revision stamp of an element.
///
/// Assigned at creation and bumped on every property or adjacency mutation.
/// Only meaningful for optimistic-concurrency comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RevisionId(pub u64);

impl RevisionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.0)
    }
}

/// Element label (e.g., "person", "loves")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(s)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_string())
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The four element kinds; each has its own identifier namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum ElementKind {
    Vertex,
    Edge,
    MultiEdge,
    HyperEdge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Vertex => "Vertex",
            ElementKind::Edge => "Edge",
            ElementKind::MultiEdge => "MultiEdge",
            ElementKind::HyperEdge => "HyperEdge",
        };
        f.write_str(name)
    }
}

/// Identifier of any graph element, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum ElementId {
    Vertex(VertexId),
    Edge(EdgeId),
    MultiEdge(MultiEdgeId),
    HyperEdge(HyperEdgeId),
}

impl ElementId {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementId::Vertex(_) => ElementKind::Vertex,
            ElementId::Edge(_) => ElementKind::Edge,
            ElementId::MultiEdge(_) => ElementKind::MultiEdge,
            ElementId::HyperEdge(_) => ElementKind::HyperEdge,
        }
    }

    pub fn raw(&self) -> u64 {
        match self {
            ElementId::Vertex(id) => id.0,
            ElementId::Edge(id) => id.0,
            ElementId::MultiEdge(id) => id.0,
            ElementId::HyperEdge(id) => id.0,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Vertex(id) => id.fmt(f),
            ElementId::Edge(id) => id.fmt(f),
            ElementId::MultiEdge(id) => id.fmt(f),
            ElementId::HyperEdge(id) => id.fmt(f),
        }
    }
}

impl From<VertexId> for ElementId {
    fn from(id: VertexId) -> Self {
        ElementId::Vertex(id)
    }
}

impl From<EdgeId> for ElementId {
    fn from(id: EdgeId) -> Self {
        ElementId::Edge(id)
    }
}

impl From<MultiEdgeId> for ElementId {
    fn from(id: MultiEdgeId) -> Self {
        ElementId::MultiEdge(id)
    }
}

impl From<HyperEdgeId> for ElementId {
    fn from(id: HyperEdgeId) -> Self {
        ElementId::HyperEdge(id)
    }
}

/// Direction of adjacency, relative to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Out,
    In,
    Both,
}
