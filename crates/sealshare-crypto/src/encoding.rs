//! Base64 serde adapters for persisted byte fields.
//!
//! Use with `#[serde(with = "...")]`. Standard alphabet with padding, to
//! match what browser-side Web Crypto clients produce.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// `Vec<u8>` as a base64 string.
pub mod base64_bytes {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Fixed-size `[u8; N]` as a base64 string; the decoded length must be `N`.
pub mod base64_array {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let decoded = STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)?;
        let len = decoded.len();
        decoded
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("expected {N} bytes, got {len}")))
    }
}

/// Decodes a standard base64 string.
pub fn decode(encoded: &str) -> Result<Vec<u8>, crate::CryptoError> {
    STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|e| crate::CryptoError::MalformedInput(format!("invalid base64: {e}")))
}

/// Encodes bytes as standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
