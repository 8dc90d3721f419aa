//! Event Domain Model
//!
//! An [`Event`] records something that happened in the frontend, such as a
//! request being sent or a response arriving. Events are routed by their
//! dot-namespaced type (`"request.send"`, `"response.received"`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Well-known event types emitted by the application.
pub mod types {
    /// A request was sent to the backend.
    pub const REQUEST_SEND: &str = "request.send";
    /// A response was received from the backend.
    pub const RESPONSE_RECEIVED: &str = "response.received";
    /// A new history entry was appended by the backend.
    pub const HISTORY_NEW: &str = "history.new";
    /// A history entry was deleted by the backend.
    pub const HISTORY_DELETED: &str = "history.deleted";
    /// The history collection was cleared.
    pub const HISTORY_CLEARED: &str = "history.cleared";
    /// A keyboard shortcut asked for a command to run; payload is the command id.
    pub const COMMAND_REQUESTED: &str = "command.requested";
}

/// An immutable record of something that happened.
///
/// The timestamp is assigned by the event bus at emission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Routing key, e.g. `"request.send"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event-specific payload, typed by convention at the call site.
    pub payload: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Optional origin label for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        timestamp: i64,
        source: Option<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp,
            source,
        }
    }

    /// Returns the namespace of the event type (the part before the first dot).
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.event_type
            .split_once('.')
            .map_or(self.event_type.as_str(), |(ns, _)| ns)
    }

    /// Deserializes the payload into the type agreed on for this event.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
