//! Port definitions (interfaces)
//!
//! The core reaches time and the native backend only through these traits;
//! adapters in the infrastructure crate implement them.

mod clock;
mod history_backend;
mod rpc_transport;

pub use clock::Clock;
pub use history_backend::{HistoryBackend, HistoryBackendError};
pub use rpc_transport::RpcTransport;
