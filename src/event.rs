//! Tracked event record.

use serde::{Deserialize, Serialize};

/// One analytics event recorded by application code.
///
/// Both fields are opaque to the queue. No schema is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Event type, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form event payload.
    pub data: String,
}

impl Event {
    /// Builds an event from any string-like type and payload.
    pub fn new(kind: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }
}
