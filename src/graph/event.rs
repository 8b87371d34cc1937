//! Graph events and observers
//!
//! Every successful mutation is announced to the subscribed observers. Property
//! mutations produce a `PropertyChanging` / `PropertyChanged` pair.

use super::property::PropertyValue;
use super::types::{ElementId, Label};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    ElementAdded {
        id: ElementId,
        label: Label,
    },
    ElementRemoved {
        id: ElementId,
        label: Label,
    },
    /// Raised before the value is written
    PropertyChanging {
        id: ElementId,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: Option<PropertyValue>,
    },
    /// Raised after the value is written
    PropertyChanged {
        id: ElementId,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: Option<PropertyValue>,
    },
}

impl GraphEvent {
    pub fn element_id(&self) -> ElementId {
        match self {
            GraphEvent::ElementAdded { id, .. }
            | GraphEvent::ElementRemoved { id, .. }
            | GraphEvent::PropertyChanging { id, .. }
            | GraphEvent::PropertyChanged { id, .. } => *id,
        }
    }
}

/// Subscriber to graph mutations
pub trait GraphObserver: Send {
    fn on_event(&mut self, event: &GraphEvent);
}

impl<F> GraphObserver for F
where
    F: FnMut(&GraphEvent) + Send,
{
    fn on_event(&mut self, event: &GraphEvent) {
        self(event)
    }
}

/// Handle returned by `PropertyGraph::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Observer that records every event; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<GraphEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GraphEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl GraphObserver for EventLog {
    fn on_event(&mut self, event: &GraphEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::VertexId;

    #[test]
    fn test_event_log_shares_events_between_clones() {
        let log = EventLog::new();
        let mut subscriber = log.clone();
        subscriber.on_event(&GraphEvent::ElementAdded {
            id: VertexId::new(1).into(),
            label: Label::new("person"),
        });

        assert_eq!(log.len(), 1);
        assert_eq!(log.events()[0].element_id(), ElementId::Vertex(VertexId::new(1)));
        log.clear();
        assert!(log.is_empty());
    }
}
