//! Cryptographic failure taxonomy.
//!
//! `Authentication` deliberately carries no detail: a wrong key, a wrong
//! nonce, and a tampered ciphertext all surface identically.

use thiserror::Error;

use sealshare_core::error::{AppError, ErrorKind};

/// Errors produced by the crypto engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The authentication tag did not verify.
    #[error("Decryption failed: invalid key or corrupted data")]
    Authentication,

    /// Input was structurally invalid before any decryption was attempted.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Key derivation parameters were rejected.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The AEAD primitive refused to encrypt (plaintext too large).
    #[error("Encryption failed")]
    Encryption,

    /// A stored password hash could not be produced or parsed.
    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl CryptoError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        AppError::with_source(ErrorKind::Crypto, err.to_string(), err)
    }
}
