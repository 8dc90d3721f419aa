//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A page size of zero was requested.
    #[error("invalid page size: {0} (must be greater than 0)")]
    InvalidPageSize(usize),

    /// A keyboard shortcut descriptor is malformed.
    #[error("invalid shortcut: {0}")]
    InvalidShortcut(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
