//! HTTP exchange descriptors as recorded by the backend.
//!
//! These mirror what the native backend stores for every executed request;
//! the frontend core only reads them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Parameters of an executed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Target URL.
    pub url: String,
    /// HTTP method (GET, POST, ...).
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional request body.
    #[serde(default)]
    pub body: Option<String>,
    /// Timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl RequestParams {
    /// Creates request parameters with no headers, no body and the default timeout.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Timing breakdown of a request. Phases that were not measured are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct RequestTiming {
    /// Total duration.
    pub total_ms: u64,
    /// DNS resolution.
    #[serde(default)]
    pub dns_ms: Option<u64>,
    /// TCP connect.
    #[serde(default)]
    pub connect_ms: Option<u64>,
    /// TLS handshake.
    #[serde(default)]
    pub tls_ms: Option<u64>,
    /// Time to first byte.
    #[serde(default)]
    pub first_byte_ms: Option<u64>,
}

/// Response recorded for an executed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Status text, e.g. "OK".
    pub status_text: String,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    #[serde(default)]
    pub body: String,
    /// Timing breakdown.
    #[serde(default)]
    pub timing: RequestTiming,
}

impl HttpResponse {
    /// Returns true for 2xx status codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
