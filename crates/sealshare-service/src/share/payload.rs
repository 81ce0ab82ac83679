//! Sealing of the access payload handed out on a granted access.

use std::fmt;

use tracing::warn;

use sealshare_core::config::CryptoConfig;
use sealshare_core::config::crypto::PLACEHOLDER_PAYLOAD_SECRET;
use sealshare_core::error::{AppError, ErrorKind};
use sealshare_core::result::AppResult;
use sealshare_crypto::{KeyDeriver, cipher};
use sealshare_entity::share::{AccessPayload, SealedPayload};

/// Derives per-share payload keys from the server payload secret.
///
/// Every sealed payload gets a fresh salt, so no two shares share a key.
#[derive(Clone)]
pub struct PayloadKeyring {
    secret: Vec<u8>,
    deriver: KeyDeriver,
}

impl PayloadKeyring {
    /// Creates a keyring from an explicit secret.
    pub fn new(secret: impl Into<Vec<u8>>, deriver: KeyDeriver) -> Self {
        Self {
            secret: secret.into(),
            deriver,
        }
    }

    /// Creates a keyring from the `[crypto]` section.
    pub fn from_config(config: &CryptoConfig) -> Self {
        if config.payload_secret == PLACEHOLDER_PAYLOAD_SECRET {
            warn!("crypto.payload_secret is the built-in placeholder; set SEALSHARE_CRYPTO__PAYLOAD_SECRET");
        }
        Self::new(
            config.payload_secret.as_bytes().to_vec(),
            KeyDeriver::from_config(config),
        )
    }

    /// Seal `payload` under a freshly salted key.
    pub fn seal(&self, payload: &AccessPayload) -> AppResult<SealedPayload> {
        let plaintext = serde_json::to_vec(payload)?;
        let derived = self.deriver.derive(&self.secret, None)?;
        let sealed = cipher::encrypt(&plaintext, &derived.key)?;
        Ok(SealedPayload {
            salt: derived.salt,
            sealed,
        })
    }

    /// Re-derive the key for `sealed` and open it.
    ///
    /// Any failure here is a server-side fault, never a caller error.
    pub fn open(&self, sealed: &SealedPayload) -> AppResult<AccessPayload> {
        let derived = self.deriver.derive(&self.secret, Some(&sealed.salt))?;
        let plaintext = sealed.sealed.open(&derived.key).map_err(|e| {
            AppError::with_source(
                ErrorKind::Crypto,
                "Stored share payload could not be opened",
                e,
            )
        })?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

impl fmt::Debug for PayloadKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadKeyring")
            .field("secret", &"<redacted>")
            .field("deriver", &self.deriver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealshare_core::types::ArtifactId;

    fn keyring(secret: &str) -> PayloadKeyring {
        PayloadKeyring::new(secret.as_bytes().to_vec(), KeyDeriver::new(10, 16))
    }

    fn payload() -> AccessPayload {
        AccessPayload {
            artifact_id: ArtifactId::new(),
            filename: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 1024,
            checksum: sealshare_crypto::checksum(b"report"),
            encryption_iv: Some("AAAAAAAAAAAAAAAA".into()),
            encryption_salt: None,
        }
    }

    #[test]
    fn test_seal_and_open() {
        let ring = keyring("server-secret");
        let original = payload();
        let sealed = ring.seal(&original).unwrap();
        assert_eq!(sealed.salt.len(), 16);
        assert_eq!(ring.open(&sealed).unwrap(), original);
    }

    #[test]
    fn test_each_seal_uses_fresh_salt() {
        let ring = keyring("server-secret");
        let a = ring.seal(&payload()).unwrap();
        let b = ring.seal(&payload()).unwrap();
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn test_other_secret_cannot_open() {
        let sealed = keyring("server-secret").seal(&payload()).unwrap();
        let err = keyring("rotated").open(&sealed).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Crypto);
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", keyring("server-secret"));
        assert!(!rendered.contains("server-secret"));
    }
}
