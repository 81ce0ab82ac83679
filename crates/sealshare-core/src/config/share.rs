//! Share link defaults.

use serde::{Deserialize, Serialize};

/// Link tokens shorter than this are rejected (256 bits of entropy).
pub const MIN_TOKEN_BYTES: usize = 32;

/// Defaults applied by the sharing workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Expiry applied when a share is created without one, in days.
    #[serde(default = "default_expiry_days")]
    pub default_expiry_days: i64,
    /// Days added by an expiry extension without an explicit amount.
    #[serde(default = "default_extension_days")]
    pub default_extension_days: i64,
    /// Random bytes per link token before URL-safe encoding.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            default_expiry_days: default_expiry_days(),
            default_extension_days: default_extension_days(),
            token_bytes: default_token_bytes(),
        }
    }
}

fn default_expiry_days() -> i64 {
    7
}

fn default_extension_days() -> i64 {
    7
}

fn default_token_bytes() -> usize {
    MIN_TOKEN_BYTES
}
