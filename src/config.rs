//! Graph configuration
//!
//! Plain serde types so a host process can load them from YAML or JSON next to
//! its own settings.

use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};

/// How identifiers are generated when the caller does not supply one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Per-kind counters starting at 1
    #[default]
    Sequential,
    /// Process-wide unique timestamps
    UniqueTimestamp,
}

/// Property graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph name (also used for derived schema graphs)
    pub name: String,
    /// Id generation for vertices, edges, multi-edges and hyper-edges
    pub id_strategy: IdStrategy,
    /// Cascade policy used by `remove_vertex_default`
    pub cascade_by_default: bool,
    /// Depth bound for fluent walks that do not specify one (None = unbounded)
    pub max_traversal_depth: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "graph".to_string(),
            id_strategy: IdStrategy::Sequential,
            cascade_by_default: false,
            max_traversal_depth: None,
        }
    }
}

impl GraphConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    pub fn with_cascade_by_default(mut self, cascade: bool) -> Self {
        self.cascade_by_default = cascade;
        self
    }

    pub fn with_max_traversal_depth(mut self, depth: usize) -> Self {
        self.max_traversal_depth = Some(depth);
        self
    }

    /// Parse a configuration from YAML; missing fields take their defaults
    pub fn from_yaml_str(text: &str) -> GraphResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| GraphError::InvalidArgument(format!("invalid graph config: {}", e)))
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(text: &str) -> GraphResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| GraphError::InvalidArgument(format!("invalid graph config: {}", e)))
    }
}
