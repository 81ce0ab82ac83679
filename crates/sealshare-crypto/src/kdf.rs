//! Password-based key derivation (PBKDF2-HMAC-SHA256).

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sealshare_core::config::CryptoConfig;

use crate::error::CryptoError;

/// Length of every symmetric key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice, rejecting anything that is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::malformed(format!(
                "key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// A derived key together with the salt that produced it.
///
/// The salt must be persisted next to anything sealed with the key,
/// otherwise the key cannot be re-derived.
#[derive(Debug, Clone)]
pub struct DerivedKey {
    /// The derived key.
    pub key: SymmetricKey,
    /// The salt used (caller-supplied or freshly generated).
    pub salt: Vec<u8>,
    /// The iteration count used.
    pub iterations: u32,
}

/// Derives a 256-bit key from `password`.
///
/// With `salt = None` a fresh 32-byte random salt is generated and returned
/// in the [`DerivedKey`]. Identical inputs always yield identical keys.
pub fn derive_key(
    password: &[u8],
    salt: Option<&[u8]>,
    iterations: u32,
) -> Result<DerivedKey, CryptoError> {
    KeyDeriver::new(iterations, 32).derive(password, salt)
}

/// Key derivation with fixed parameters, usually built from configuration.
#[derive(Debug, Clone, Copy)]
pub struct KeyDeriver {
    iterations: u32,
    salt_length: usize,
}

impl KeyDeriver {
    /// Creates a deriver with an explicit iteration count and salt length.
    pub const fn new(iterations: u32, salt_length: usize) -> Self {
        Self {
            iterations,
            salt_length,
        }
    }

    /// Creates a deriver from the `[crypto]` configuration section.
    pub fn from_config(config: &CryptoConfig) -> Self {
        Self::new(config.pbkdf2_iterations, config.salt_length)
    }

    /// Configured iteration count.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Generates a random salt of the configured length.
    pub fn generate_salt(&self) -> Vec<u8> {
        let mut salt = vec![0u8; self.salt_length];
        rand::thread_rng().fill_bytes(&mut salt);
        salt
    }

    /// Derives a key, generating a salt when none is given.
    pub fn derive(&self, password: &[u8], salt: Option<&[u8]>) -> Result<DerivedKey, CryptoError> {
        if self.iterations == 0 {
            return Err(CryptoError::KeyDerivation(
                "iteration count must be greater than zero".to_string(),
            ));
        }

        let salt = match salt {
            Some([]) => return Err(CryptoError::malformed("salt must not be empty")),
            Some(salt) => salt.to_vec(),
            None => {
                if self.salt_length == 0 {
                    return Err(CryptoError::KeyDerivation(
                        "salt length must be greater than zero".to_string(),
                    ));
                }
                self.generate_salt()
            }
        };

        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password, &salt, self.iterations, &mut key);
        let derived = DerivedKey {
            key: SymmetricKey::from_bytes(key),
            salt,
            iterations: self.iterations,
        };
        key.zeroize();
        Ok(derived)
    }
}
