//! Structured backend errors and their normalization.
//!
//! Errors coming back over the RPC bridge arrive in several shapes: an
//! already-typed [`AppError`], a JSON-encoded string, a bare object with
//! snake_case or camelCase keys, or some native error. [`normalize_backend_error`]
//! folds all of them into a single [`AppError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationId;

/// Code used when the original error carried none.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Application error with a correlation id for tracing across the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppError {
    /// Correlation id of the failed operation, when known.
    #[serde(default, alias = "correlationId")]
    pub correlation_id: Option<String>,
    /// Error code, e.g. `HTTP_REQUEST_FAILED`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(default)]
    pub details: Option<Value>,
}

impl AppError {
    /// Creates an error without correlation id or details.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_id: None,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches a correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: &CorrelationId) -> Self {
        self.correlation_id = Some(id.to_string());
        self
    }

    fn unknown(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_ERROR_CODE, message)
    }

    /// Reads an error out of a JSON object carrying at least `code` and `message`.
    fn from_object(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let code = object.get("code")?.as_str()?;
        let message = object.get("message")?.as_str()?;
        let correlation_id = object
            .get("correlation_id")
            .or_else(|| object.get("correlationId"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            correlation_id,
            code: code.to_string(),
            message: message.to_string(),
            details: object.get("details").filter(|d| !d.is_null()).cloned(),
        })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

/// An error as it came off the bridge, before normalization.
#[derive(Debug)]
pub enum RawBackendError {
    /// Already a structured error.
    Typed(AppError),
    /// A JSON value: usually a string (possibly JSON-encoded) or an object.
    Value(Value),
    /// A native error raised on this side of the bridge.
    Native(Box<dyn std::error::Error + Send + Sync>),
}

impl From<AppError> for RawBackendError {
    fn from(error: AppError) -> Self {
        Self::Typed(error)
    }
}

impl From<Value> for RawBackendError {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for RawBackendError {
    fn from(message: String) -> Self {
        Self::Value(Value::String(message))
    }
}

impl From<&str> for RawBackendError {
    fn from(message: &str) -> Self {
        Self::Value(Value::String(message.to_string()))
    }
}

/// Normalizes any backend error shape into an [`AppError`].
///
/// Checks run in a fixed order: already typed, JSON-encoded string,
/// object with `code`/`message`, then a generic `UNKNOWN_ERROR` fallback
/// carrying the original text. When the result has no correlation id the
/// supplied one is stamped on it.
#[must_use]
pub fn normalize_backend_error(
    raw: RawBackendError,
    correlation_id: Option<&CorrelationId>,
) -> AppError {
    let mut error = match raw {
        RawBackendError::Typed(error) => error,
        RawBackendError::Value(Value::String(text)) => serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|parsed| AppError::from_object(&parsed))
            .unwrap_or_else(|| AppError::unknown(text)),
        RawBackendError::Value(value) => {
            AppError::from_object(&value).unwrap_or_else(|| AppError::unknown(value.to_string()))
        }
        RawBackendError::Native(error) => AppError::unknown(error.to_string()),
    };

    if error.correlation_id.is_none() {
        error.correlation_id = correlation_id.map(ToString::to_string);
    }
    error
}
