use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot remove {requested} sent events, session holds {len}")]
    PrefixOutOfRange { requested: usize, len: usize },
}

/// Ordered log of events that have not been confirmed sent.
///
/// Serializes as `{"events": [...]}`, which is both the snapshot document and
/// the upload body shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    events: Vec<Event>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Drops exactly the first `count` events, preserving the rest in order.
    pub fn remove_sent_prefix(&mut self, count: usize) -> Result<(), SessionError> {
        if count > self.events.len() {
            return Err(SessionError::PrefixOutOfRange {
                requested: count,
                len: self.events.len(),
            });
        }
        self.events.drain(..count);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Owned copy of the pending events, unaffected by later appends.
    pub fn snapshot_all(&self) -> Vec<Event> {
        self.events.clone()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
