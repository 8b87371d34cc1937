//! Manual and automatic indices
//!
//! Maps (key, value) pairs to sets of element ids, kept consistent with graph
//! mutation by the owning `PropertyGraph`.

pub mod manager;
pub mod property_index;

pub use manager::IndexManager;
pub use property_index::{
    property_keys, ElementFilter, Index, IndexEntry, IndexKeyFn, IndexMode, IndexedElement,
};
