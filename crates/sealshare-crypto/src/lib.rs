//! # sealshare-crypto
//!
//! The symmetric side of share protection.
//!
//! ## Modules
//!
//! - `kdf`: PBKDF2-HMAC-SHA256 password-based key derivation
//! - `cipher`: AES-256-GCM encryption with a detached authentication tag
//! - `envelope`: password-sealed envelopes combining `kdf` and `cipher`
//! - `checksum`: SHA-256 content digests for integrity checks
//! - `password`: Argon2id hashing of share passwords
//! - `encoding`: base64 serde adapters for persisted byte fields

pub mod checksum;
pub mod cipher;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod password;

use subtle::ConstantTimeEq;

pub use checksum::{checksum, verify_checksum};
pub use cipher::{EncryptedPayload, NONCE_LEN, TAG_LEN, decrypt, encrypt};
pub use envelope::{
    PasswordEnvelope, decrypt_with_password, encrypt_with_password, validate_envelope_metadata,
};
pub use error::CryptoError;
pub use kdf::{DerivedKey, KEY_LEN, KeyDeriver, SymmetricKey, derive_key};
pub use password::PasswordHasher;

/// Compares two byte strings without short-circuiting on the first mismatch.
///
/// Inputs of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"device-a", b"device-a"));
        assert!(!constant_time_eq(b"device-a", b"device-b"));
        assert!(!constant_time_eq(b"short", b"longer value"));
        assert!(constant_time_eq(b"", b""));
    }
}
