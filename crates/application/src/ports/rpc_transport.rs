//! RPC transport port
//!
//! The bridge to the native backend process: a named command plus JSON
//! arguments in, a JSON value or a raw error out.

use async_trait::async_trait;
use runi_domain::RawBackendError;
use serde_json::Value;

/// Port for invoking a backend command over the RPC bridge.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invokes `command` with `args` and returns the raw JSON result.
    ///
    /// # Errors
    ///
    /// Returns the error exactly as the bridge produced it; callers
    /// normalize it with [`runi_domain::normalize_backend_error`].
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, RawBackendError>;
}
