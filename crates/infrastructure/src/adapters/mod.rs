//! Adapter implementations of the application ports.

mod in_memory_history;
mod rpc_history;
mod system_clock;

pub use in_memory_history::{InMemoryHistoryBackend, NOTIFICATION_SOURCE};
pub use rpc_history::{GET_HISTORY_BATCH, GET_HISTORY_COUNT, GET_HISTORY_IDS, RpcHistoryBackend};
pub use system_clock::SystemClock;
