//! Request History Domain Model
//!
//! Defines the hydrated history records served by the backend and the
//! push notifications it sends when the collection changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::types;
use crate::http::{HttpResponse, RequestParams};

/// A single executed request and the response it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Opaque backend id (`hist_...`).
    pub id: String,
    /// When the request was executed.
    pub timestamp: DateTime<Utc>,
    /// The request as sent.
    pub request: RequestParams,
    /// The response received.
    pub response: HttpResponse,
}

impl HistoryEntry {
    /// Creates a new entry with a fresh id, stamped now.
    #[must_use]
    pub fn new(request: RequestParams, response: HttpResponse) -> Self {
        Self {
            id: crate::generate_history_id(),
            timestamp: Utc::now(),
            request,
            response,
        }
    }

    /// Returns a human-readable "time ago" string.
    #[must_use]
    pub fn time_ago(&self) -> String {
        let duration = Utc::now().signed_duration_since(self.timestamp);

        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else if duration.num_days() < 7 {
            format!("{}d ago", duration.num_days())
        } else {
            self.timestamp.format("%Y-%m-%d").to_string()
        }
    }

    /// Returns the total duration as a display string.
    #[must_use]
    pub fn duration_display(&self) -> String {
        match self.response.timing.total_ms {
            ms if ms < 1000 => format!("{ms}ms"),
            ms => format!("{:.1}s", ms as f64 / 1000.0),
        }
    }

    /// One-line summary, e.g. `GET https://x -> 200 OK (150ms)`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} {} -> {} {} ({})",
            self.request.method.to_uppercase(),
            self.request.url,
            self.response.status,
            self.response.status_text,
            self.duration_display()
        )
    }
}

/// Out-of-band change notifications pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum HistoryNotification {
    /// An entry was appended.
    New(HistoryEntry),
    /// The entry with this id was deleted.
    Deleted(String),
    /// The whole collection was cleared.
    Cleared,
}

impl HistoryNotification {
    /// Event type under which this notification is published.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::New(_) => types::HISTORY_NEW,
            Self::Deleted(_) => types::HISTORY_DELETED,
            Self::Cleared => types::HISTORY_CLEARED,
        }
    }

    /// Payload carried on the event bus: the entry, the deleted id, or null.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded as JSON.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::New(entry) => serde_json::to_value(entry),
            Self::Deleted(id) => Ok(serde_json::Value::String(id.clone())),
            Self::Cleared => Ok(serde_json::Value::Null),
        }
    }
}
