//! Application error types

use runi_domain::DomainError;
use thiserror::Error;

use crate::command_registry::CommandError;
use crate::ports::HistoryBackendError;

/// Error returned by event, command and shortcut handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by event, command and shortcut handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Registering, looking up or running a command failed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A backend history call failed.
    #[error("history error: {0}")]
    History(#[from] HistoryBackendError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
