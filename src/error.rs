//! Error types shared by the graph, index, pipe and transaction layers

use crate::graph::types::ElementKind;
use thiserror::Error;

/// Coarse classification of a [`GraphError`], for callers that branch on the
/// failure category rather than on its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateId,
    ElementNotFound,
    KeyNotFound,
    IllegalState,
    InvalidArgument,
    CascadeRequired,
    RollbackRequired,
}

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An element of this kind already uses the identifier
    #[error("{kind} {id} already exists")]
    DuplicateId { kind: ElementKind, id: String },

    /// An index of this kind already uses the name
    #[error("{kind} index '{name}' already exists")]
    DuplicateIndex { kind: ElementKind, name: String },

    /// Lookup or edge endpoint missing from the graph
    #[error("{kind} {id} not found")]
    ElementNotFound { kind: ElementKind, id: String },

    /// Strict property read on an absent key
    #[error("Property key '{0}' not found")]
    KeyNotFound(String),

    /// Pipe driven out of protocol order, or a mutation in the wrong transaction state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Rejected argument (reserved key, unsupported filter mode, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Removal refused because the element still has live adjacency
    #[error("{kind} {id} has {adjacent} adjacent element(s); cascade required")]
    CascadeRequired {
        kind: ElementKind,
        id: String,
        adjacent: usize,
    },

    /// A nested transaction rolled back, so its parent could not commit
    #[error("Transaction was marked rollback-only by a nested rollback")]
    RollbackRequired,
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::DuplicateId { .. } | GraphError::DuplicateIndex { .. } => {
                ErrorKind::DuplicateId
            }
            GraphError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            GraphError::KeyNotFound(_) => ErrorKind::KeyNotFound,
            GraphError::IllegalState(_) => ErrorKind::IllegalState,
            GraphError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            GraphError::CascadeRequired { .. } => ErrorKind::CascadeRequired,
            GraphError::RollbackRequired => ErrorKind::RollbackRequired,
        }
    }

    pub(crate) fn not_found(kind: ElementKind, id: impl ToString) -> Self {
        GraphError::ElementNotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: ElementKind, id: impl ToString) -> Self {
        GraphError::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
