//! Argon2id hashing and verification of share passwords.
//!
//! Shares store only the PHC-format hash. Verification recomputes the hash
//! and compares in constant time inside the `argon2` crate.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::error::CryptoError;

/// Hashes and verifies share passwords using Argon2id.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Creates a hasher with the default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hasher with explicit cost parameters.
    ///
    /// Intended for tests and low-powered deployments.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, CryptoError> {
        let params = argon2::Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| CryptoError::PasswordHash(format!("invalid Argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        })
    }

    /// Hashes a plaintext password with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::PasswordHash(format!("hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not. A hash
    /// that cannot be parsed is an error, never a silent mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CryptoError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| CryptoError::PasswordHash(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::PasswordHash(format!(
                "verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("secret", &hash).unwrap());
        assert!(!hasher.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash_password("secret").unwrap();
        let b = hasher.hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_default_params_verify_cheap_hash() {
        // Parameters travel inside the PHC string.
        let hash = hasher().hash_password("secret").unwrap();
        assert!(PasswordHasher::new().verify_password("secret", &hash).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_error() {
        let err = hasher().verify_password("secret", "not-a-hash").unwrap_err();
        assert!(matches!(err, CryptoError::PasswordHash(_)));
    }
}
