//! ID generation utilities.

use uuid::Uuid;

/// Prefix carried by every history entry id issued by the backend.
pub const HISTORY_ID_PREFIX: &str = "hist_";

/// Generates a new time-ordered UUID v7 as a string.
///
/// This is the standard ID format for correlation ids and other
/// frontend-issued identifiers.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Generates a history entry id in the backend's `hist_<32 hex>` shape.
#[must_use]
pub fn generate_history_id() -> String {
    format!("{HISTORY_ID_PREFIX}{}", Uuid::new_v4().simple())
}
