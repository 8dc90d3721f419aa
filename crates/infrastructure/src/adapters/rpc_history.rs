//! History backend over the RPC bridge.

use std::sync::Arc;

use async_trait::async_trait;
use runi_application::current_correlation_id;
use runi_application::ports::{HistoryBackend, HistoryBackendError, RpcTransport};
use runi_domain::{HistoryEntry, normalize_backend_error};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

/// Backend command returning the total entry count.
pub const GET_HISTORY_COUNT: &str = "get_history_count";
/// Backend command returning a page of entry ids.
pub const GET_HISTORY_IDS: &str = "get_history_ids";
/// Backend command returning hydrated entries for a list of ids.
pub const GET_HISTORY_BATCH: &str = "get_history_batch";

/// [`HistoryBackend`] that forwards each call to the native backend.
///
/// Transport failures are normalized into [`runi_domain::AppError`] and
/// stamped with the correlation id of the calling task.
pub struct RpcHistoryBackend<T: ?Sized> {
    transport: Arc<T>,
}

impl<T: RpcTransport + ?Sized> RpcHistoryBackend<T> {
    /// Creates a backend over `transport`.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    async fn call<R: DeserializeOwned>(
        &self,
        command: &'static str,
        args: Value,
    ) -> Result<R, HistoryBackendError> {
        debug!(command, "invoking backend");
        let value = self
            .transport
            .invoke(command, args)
            .await
            .map_err(|raw| normalize_backend_error(raw, current_correlation_id().as_ref()))?;

        serde_json::from_value(value).map_err(|err| HistoryBackendError::Decode {
            call: command,
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl<T: RpcTransport + ?Sized> HistoryBackend for RpcHistoryBackend<T> {
    async fn count(&self) -> Result<usize, HistoryBackendError> {
        self.call(GET_HISTORY_COUNT, json!({})).await
    }

    async fn ids(&self, offset: usize, limit: usize) -> Result<Vec<String>, HistoryBackendError> {
        self.call(
            GET_HISTORY_IDS,
            json!({ "limit": limit, "offset": offset, "sortDesc": true }),
        )
        .await
    }

    async fn batch(&self, ids: &[String]) -> Result<Vec<HistoryEntry>, HistoryBackendError> {
        self.call(GET_HISTORY_BATCH, json!({ "ids": ids })).await
    }
}
