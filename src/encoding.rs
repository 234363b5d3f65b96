//! Encoding helpers shared by the persistence adapter and `util.*`.

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::Value;

/// `[A-Za-z0-9]{length}` from the thread RNG.
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn base64_to_bytes(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .context("invalid base64 payload")
}

/// Base64 of the compact JSON text of `value`.
pub fn json_to_base64(value: &Value) -> Result<String> {
    let text = serde_json::to_string(value).context("value is not serializable")?;
    Ok(STANDARD.encode(text))
}

pub fn base64_to_json(encoded: &str) -> Result<Value> {
    let bytes = base64_to_bytes(encoded)?;
    serde_json::from_slice(&bytes).context("decoded payload is not JSON")
}

/// `new Date().toISOString()`: UTC with millisecond precision and a `Z`.
pub fn datetime_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn random_string_is_alphanumeric_of_requested_length() {
        let value = random_string(16);
        assert_eq!(value.len(), 16);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(random_string(0).is_empty());
    }

    #[test]
    fn base64_matches_btoa_output() {
        assert_eq!(bytes_to_base64(b"FocusAny"), "Rm9jdXNBbnk=");
        assert_eq!(base64_to_bytes("Rm9jdXNBbnk=").unwrap(), b"FocusAny");
        assert!(base64_to_bytes("not base64!").is_err());
    }

    #[test]
    fn json_payloads_survive_base64() {
        let value = json!({"a": 1, "b": ["x"]});
        let encoded = json_to_base64(&value).unwrap();
        assert_eq!(encoded, "eyJhIjoxLCJiIjpbIngiXX0=");
        assert_eq!(base64_to_json(&encoded).unwrap(), value);
        assert!(base64_to_json("bm90IGpzb24=").is_err());
    }

    #[test]
    fn datetime_string_is_iso_with_millis() {
        let stamp = datetime_string();
        assert_eq!(stamp.len(), 24);
        assert!(stamp.ends_with('Z'));
        assert_eq!(&stamp[10..11], "T");
        assert_eq!(&stamp[19..20], ".");
    }
}
