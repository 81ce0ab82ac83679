//! Key derivation and payload sealing configuration.

use serde::{Deserialize, Serialize};

/// Smallest salt the loader accepts, in bytes.
pub const MIN_SALT_LENGTH: usize = 16;

/// Shipped value of `payload_secret`; deployments must override it.
pub const PLACEHOLDER_PAYLOAD_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Cryptographic parameters for password-derived keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA256 iteration count.
    #[serde(default = "default_iterations")]
    pub pbkdf2_iterations: u32,
    /// Length of freshly generated salts in bytes.
    #[serde(default = "default_salt_length")]
    pub salt_length: usize,
    /// Server-side secret from which per-share payload keys are derived.
    #[serde(default = "default_payload_secret", skip_serializing)]
    pub payload_secret: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_iterations(),
            salt_length: default_salt_length(),
            payload_secret: default_payload_secret(),
        }
    }
}

fn default_iterations() -> u32 {
    100_000
}

fn default_salt_length() -> usize {
    32
}

fn default_payload_secret() -> String {
    PLACEHOLDER_PAYLOAD_SECRET.to_string()
}
