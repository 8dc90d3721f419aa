//! Runi Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings persistence and
//! logging setup.

pub mod adapters;
pub mod logging;
pub mod persistence;
pub mod serialization;

pub use adapters::{InMemoryHistoryBackend, RpcHistoryBackend, SystemClock};
pub use logging::{LoggingConfig, LoggingError, init_logging, log_level, parse_level, set_log_level};
pub use persistence::{SettingsError, SettingsRepository};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
