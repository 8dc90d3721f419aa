//! History backend port
//!
//! The native backend owns the history collection. The frontend reaches it
//! through three calls: total count, a page of ids, and a batch of hydrated
//! entries by id.

use async_trait::async_trait;
use runi_domain::{AppError, HistoryEntry};

/// Errors that can occur when talking to the history backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryBackendError {
    /// The backend rejected the call.
    #[error("{0}")]
    Backend(#[from] AppError),

    /// The backend answered with something that could not be decoded.
    #[error("failed to decode {call} response: {reason}")]
    Decode {
        /// The call whose response was malformed.
        call: &'static str,
        /// Decoder message.
        reason: String,
    },
}

/// Port for the backend-owned history collection.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Returns the total number of entries.
    async fn count(&self) -> Result<usize, HistoryBackendError>;

    /// Returns up to `limit` entry ids starting at `offset`, newest first.
    async fn ids(&self, offset: usize, limit: usize) -> Result<Vec<String>, HistoryBackendError>;

    /// Returns the hydrated entries for `ids`.
    ///
    /// Entries that no longer exist are omitted. The order of the returned
    /// entries is backend-defined.
    async fn batch(&self, ids: &[String]) -> Result<Vec<HistoryEntry>, HistoryBackendError>;
}
