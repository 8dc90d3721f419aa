//! Runi Application - Frontend core services
//!
//! This crate holds the in-process services of the client core and the
//! ports they talk to: the event bus, the command registry, and the
//! windowed history loader. Adapters live in the infrastructure crate.

pub mod command_registry;
pub mod correlation;
pub mod error;
pub mod event_bus;
pub mod ports;
pub mod windowed_history;

pub use command_registry::{Command, CommandError, CommandRegistry, Shortcut};
pub use correlation::{
    current_correlation_id, ensure_correlation_id, sync_scope, with_correlation_id,
};
pub use error::{ApplicationError, ApplicationResult, HandlerError, HandlerResult};
pub use event_bus::{EventBus, EventHandler, Subscription, handler};
pub use windowed_history::{HistoryWindow, LoadOutcome, WindowedHistory};
