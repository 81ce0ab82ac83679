//! Sealed artifact metadata returned on a granted access.

use serde::{Deserialize, Serialize};

use sealshare_core::types::ArtifactId;
use sealshare_crypto::EncryptedPayload;
use sealshare_crypto::encoding::base64_bytes;

/// What a granted caller receives: enough to fetch the artifact bytes from
/// the artifact store and decrypt them client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPayload {
    /// The shared artifact.
    pub artifact_id: ArtifactId,
    /// Original file name.
    pub filename: String,
    /// MIME type of the plaintext artifact.
    pub mime_type: String,
    /// Plaintext size in bytes.
    pub size_bytes: u64,
    /// Hex SHA-256 of the plaintext artifact.
    pub checksum: String,
    /// Base64 nonce the client used to encrypt the artifact.
    pub encryption_iv: Option<String>,
    /// Base64 KDF salt the client used to derive the artifact key.
    pub encryption_salt: Option<String>,
}

/// An [`AccessPayload`] sealed under a key derived from the server payload
/// secret and the per-share `salt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    /// KDF salt for this share.
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// The AEAD triple.
    #[serde(flatten)]
    pub sealed: EncryptedPayload,
}
