//! In-process history backend.
//!
//! Keeps the collection in memory, newest first, and answers the three
//! history calls the way the native backend does. When attached to an
//! [`EventBus`] it also publishes a [`HistoryNotification`] for every
//! change. Used by the headless binary and by tests.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use runi_application::EventBus;
use runi_application::ports::{HistoryBackend, HistoryBackendError};
use runi_domain::{AppError, HistoryEntry, HistoryNotification};
use tracing::{debug, warn};

/// Source tag stamped on published notifications.
pub const NOTIFICATION_SOURCE: &str = "history-backend";

/// History collection held in memory.
#[derive(Default)]
pub struct InMemoryHistoryBackend {
    entries: RwLock<Vec<HistoryEntry>>,
    bus: Option<EventBus>,
    failure: Mutex<Option<AppError>>,
}

impl InMemoryHistoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `entries`, sorted newest first.
    #[must_use]
    pub fn with_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self {
            entries: RwLock::new(entries),
            ..Self::default()
        }
    }

    /// Publishes change notifications on `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Makes every call fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<AppError>) {
        *self.failure.lock() = error;
    }

    /// Adds `entry` as the newest entry.
    pub fn append(&self, entry: HistoryEntry) {
        self.entries.write().insert(0, entry.clone());
        self.publish(&HistoryNotification::New(entry));
    }

    /// Removes the entry with `id`. Returns false if it did not exist.
    pub fn delete(&self, id: &str) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            entries.len() != before
        };

        if removed {
            self.publish(&HistoryNotification::Deleted(id.to_string()));
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.publish(&HistoryNotification::Cleared);
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn publish(&self, notification: &HistoryNotification) {
        let Some(bus) = &self.bus else {
            return;
        };

        let event_type = notification.event_type();
        match notification.payload() {
            Ok(payload) => {
                debug!(event_type, "publishing history notification");
                bus.emit_from(event_type, payload, Some(NOTIFICATION_SOURCE));
            }
            Err(err) => warn!(event_type, error = %err, "history notification not published"),
        }
    }

    fn check_failure(&self) -> Result<(), HistoryBackendError> {
        match self.failure.lock().clone() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl HistoryBackend for InMemoryHistoryBackend {
    async fn count(&self) -> Result<usize, HistoryBackendError> {
        self.check_failure()?;
        Ok(self.len())
    }

    async fn ids(&self, offset: usize, limit: usize) -> Result<Vec<String>, HistoryBackendError> {
        self.check_failure()?;
        Ok(self
            .entries
            .read()
            .iter()
            .skip(offset)
            .take(limit)
            .map(|entry| entry.id.clone())
            .collect())
    }

    // Storage order, not request order.
    async fn batch(&self, ids: &[String]) -> Result<Vec<HistoryEntry>, HistoryBackendError> {
        self.check_failure()?;
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|entry| ids.contains(&entry.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adapters::SystemClock;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use runi_application::handler;
    use runi_domain::event::types;
    use runi_domain::{HttpResponse, RequestParams, RequestTiming};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn entry(id: &str, minutes_ago: i64) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            request: RequestParams::new("GET", "https://example.com"),
            response: HttpResponse {
                status: 200,
                status_text: "OK".to_string(),
                headers: BTreeMap::new(),
                body: String::new(),
                timing: RequestTiming::default(),
            },
        }
    }

    #[tokio::test]
    async fn test_ids_are_newest_first_and_paged() {
        let backend =
            InMemoryHistoryBackend::with_entries(vec![entry("old", 30), entry("new", 1), entry("mid", 10)]);

        assert_eq!(backend.count().await.unwrap(), 3);
        assert_eq!(backend.ids(0, 2).await.unwrap(), vec!["new", "mid"]);
        assert_eq!(backend.ids(2, 2).await.unwrap(), vec!["old"]);
        assert!(backend.ids(5, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_skips_unknown_ids() {
        let backend = InMemoryHistoryBackend::with_entries(vec![entry("a", 2), entry("b", 1)]);

        let found = backend
            .batch(&["a".to_string(), "gone".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = InMemoryHistoryBackend::new();
        backend.set_failure(Some(AppError::new("UNKNOWN_ERROR", "Network error")));

        let err = backend.count().await.unwrap_err();
        assert!(err.to_string().contains("Network error"));

        backend.set_failure(None);
        assert_eq!(backend.count().await.unwrap(), 0);
    }

    #[test]
    fn test_changes_publish_notifications() {
        let bus = EventBus::new(Arc::new(SystemClock::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for event_type in [types::HISTORY_NEW, types::HISTORY_DELETED, types::HISTORY_CLEARED] {
            let seen = Arc::clone(&seen);
            bus.on(
                event_type,
                handler(move |event| {
                    seen.lock().push((event.event_type.clone(), event.source.clone()));
                    Ok(())
                }),
            );
        }

        let backend = InMemoryHistoryBackend::new().with_event_bus(bus);
        backend.append(entry("x", 0));
        assert!(backend.delete("x"));
        assert!(!backend.delete("x"));
        backend.clear();

        let source = Some(NOTIFICATION_SOURCE.to_string());
        assert_eq!(
            *seen.lock(),
            vec![
                (types::HISTORY_NEW.to_string(), source.clone()),
                (types::HISTORY_DELETED.to_string(), source.clone()),
                (types::HISTORY_CLEARED.to_string(), source),
            ]
        );
    }
}
