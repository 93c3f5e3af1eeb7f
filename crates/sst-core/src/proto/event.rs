use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of the dev server's event stream.
///
/// On the wire this is `{"type": ..., "event": {...}}`. The payload stays
/// opaque here; typed views are decoded on demand by the consumers that care
/// about a particular event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(rename = "event", default)]
    pub payload: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}
