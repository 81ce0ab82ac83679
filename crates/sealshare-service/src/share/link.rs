//! Share link token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use sealshare_core::config::ShareConfig;
use sealshare_core::config::share::MIN_TOKEN_BYTES;

/// Generates unguessable URL-safe link tokens.
#[derive(Debug, Clone)]
pub struct LinkService {
    token_bytes: usize,
}

impl LinkService {
    /// Creates a generator for tokens of `token_bytes` random bytes.
    ///
    /// Values below the 256-bit floor are raised to it.
    pub fn new(token_bytes: usize) -> Self {
        Self {
            token_bytes: token_bytes.max(MIN_TOKEN_BYTES),
        }
    }

    /// Creates a generator from the `[share]` section.
    pub fn from_config(config: &ShareConfig) -> Self {
        Self::new(config.token_bytes)
    }

    /// Entropy per token in bits.
    pub fn entropy_bits(&self) -> usize {
        self.token_bytes * 8
    }

    /// Generates a fresh token: random bytes, base64url without padding.
    pub fn generate_token(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl Default for LinkService {
    fn default() -> Self {
        Self::new(MIN_TOKEN_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_token_shape() {
        let token = LinkService::default().generate_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_floor_is_enforced() {
        let links = LinkService::new(8);
        assert_eq!(links.entropy_bits(), 256);
    }

    #[test]
    fn test_tokens_are_unique() {
        let links = LinkService::default();
        let tokens: HashSet<_> = (0..1000).map(|_| links.generate_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}
