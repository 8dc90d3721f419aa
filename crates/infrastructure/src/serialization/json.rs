//! Stable JSON encoding and decoding.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),
}

/// Serializes `value` as pretty JSON bytes with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use runi_domain::AppSettings;

    #[test]
    fn test_settings_layout() {
        let bytes = to_json_stable_bytes(&AppSettings::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"history_page_size\": 50,"));
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: AppSettings = from_json_bytes(br#"{"log_level": "debug"}"#).unwrap();

        assert_eq!(
            settings,
            AppSettings {
                log_level: "debug".to_string(),
                ..AppSettings::default()
            }
        );
    }

    #[test]
    fn test_invalid_json_is_a_deserialize_error() {
        let result: Result<AppSettings, _> = from_json_bytes(b"{ not json");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
