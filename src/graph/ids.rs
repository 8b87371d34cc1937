//! Identifier and revision generation

use crate::config::IdStrategy;
use crate::error::{GraphError, GraphResult};
use crate::graph::types::RevisionId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Last stamp handed out by [`unique_timestamp`], shared by every graph in the process.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique, strictly increasing timestamp (nanoseconds since the epoch).
///
/// When the wall clock does not advance between two calls (or steps backwards),
/// the previous stamp plus one is returned instead. Stamps stay below `i64::MAX`
/// so they remain representable as integer property values.
pub fn unique_timestamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
        .min(i64::MAX as u64 - 1);

    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Id source for one element kind of one graph.
///
/// A sequential source whose `next` is `None` has handed out (or seen) `u64::MAX`
/// and cannot generate further ids.
#[derive(Debug, Clone)]
pub(crate) enum IdSource {
    Sequential { next: Option<u64> },
    UniqueTimestamp,
}

impl IdSource {
    pub(crate) fn new(strategy: IdStrategy) -> Self {
        match strategy {
            IdStrategy::Sequential => IdSource::Sequential { next: Some(1) },
            IdStrategy::UniqueTimestamp => IdSource::UniqueTimestamp,
        }
    }

    /// Next candidate id. The caller still checks it against ids supplied by users.
    ///
    /// Fails with `IllegalState` once the sequential id space is used up.
    pub(crate) fn next_id(&mut self) -> GraphResult<u64> {
        match self {
            IdSource::Sequential { next } => {
                let id = next.ok_or_else(|| {
                    GraphError::IllegalState("sequential id space exhausted".to_string())
                })?;
                *next = id.checked_add(1);
                Ok(id)
            }
            IdSource::UniqueTimestamp => Ok(unique_timestamp()),
        }
    }

    /// Keep sequential ids ahead of a caller-supplied id.
    pub(crate) fn observe(&mut self, used: u64) {
        if let IdSource::Sequential { next } = self {
            if let Some(candidate) = *next {
                if used >= candidate {
                    *next = used.checked_add(1);
                }
            }
        }
    }
}

/// Graph-wide revision counter. Every mutation draws a fresh, larger stamp.
#[derive(Debug, Clone, Default)]
pub(crate) struct RevisionClock {
    last: u64,
}

impl RevisionClock {
    pub(crate) fn tick(&mut self) -> RevisionId {
        self.last += 1;
        RevisionId(self.last)
    }
}
