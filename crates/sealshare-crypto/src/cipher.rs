//! AES-256-GCM with a detached authentication tag.
//!
//! Nonces are always generated here; callers cannot supply one for
//! encryption, which keeps nonce reuse under a single key out of reach.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::encoding::{base64_array, base64_bytes};
use crate::error::CryptoError;
use crate::kdf::SymmetricKey;

/// GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Ciphertext, nonce, and tag, which only decrypt together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Nonce used for this encryption.
    #[serde(with = "base64_array")]
    pub nonce: [u8; NONCE_LEN],
    /// Authentication tag over the ciphertext.
    #[serde(with = "base64_array")]
    pub tag: [u8; TAG_LEN],
    /// Encrypted bytes, same length as the plaintext.
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Decrypts this payload with `key`.
    pub fn open(&self, key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        decrypt(&self.ciphertext, key, &self.nonce, &self.tag)
    }

    /// Serializes as `nonce || tag || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + TAG_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses the `nonce || tag || ciphertext` layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::malformed(format!(
                "sealed data must be at least {} bytes, got {}",
                NONCE_LEN + TAG_LEN,
                bytes.len()
            )));
        }
        let (nonce, rest) = bytes.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut payload = Self {
            nonce: [0u8; NONCE_LEN],
            tag: [0u8; TAG_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        payload.nonce.copy_from_slice(nonce);
        payload.tag.copy_from_slice(tag);
        Ok(payload)
    }
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
///
/// Empty plaintexts are valid and produce an empty ciphertext plus a tag.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Result<EncryptedPayload, CryptoError> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| CryptoError::Encryption)?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(EncryptedPayload {
        nonce,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Decrypts and authenticates `ciphertext`.
///
/// Length problems with `nonce` or `tag` are reported as
/// [`CryptoError::MalformedInput`] before any decryption happens. Every
/// verification failure is the single opaque [`CryptoError::Authentication`].
pub fn decrypt(
    ciphertext: &[u8],
    key: &SymmetricKey,
    nonce: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::malformed(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }
    if tag.len() != TAG_LEN {
        return Err(CryptoError::malformed(format!(
            "tag must be {TAG_LEN} bytes, got {}",
            tag.len()
        )));
    }

    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CryptoError::Authentication)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> SymmetricKey {
        SymmetricKey::from_bytes([0x42; 32])
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let sealed = encrypt(b"", &key()).unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert_eq!(sealed.open(&key()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let a = encrypt(b"same input", &key()).unwrap();
        let b = encrypt(b"same input", &key()).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_key_is_authentication_error() {
        let sealed = encrypt(b"metadata", &key()).unwrap();
        let other = SymmetricKey::from_bytes([0x43; 32]);
        assert_eq!(sealed.open(&other), Err(CryptoError::Authentication));
    }

    #[test]
    fn test_wrong_nonce_is_authentication_error() {
        let sealed = encrypt(b"metadata", &key()).unwrap();
        let mut nonce = sealed.nonce;
        nonce[0] ^= 0xFF;
        let err = decrypt(&sealed.ciphertext, &key(), &nonce, &sealed.tag).unwrap_err();
        assert_eq!(err, CryptoError::Authentication);
    }

    #[test]
    fn test_bad_lengths_are_malformed() {
        let sealed = encrypt(b"metadata", &key()).unwrap();
        let err = decrypt(&sealed.ciphertext, &key(), &sealed.nonce[..8], &sealed.tag).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedInput(_)));
        let err = decrypt(&sealed.ciphertext, &key(), &sealed.nonce, &sealed.tag[..15]).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedInput(_)));
    }

    #[test]
    fn test_wire_layout_roundtrip() {
        let sealed = encrypt(b"layout", &key()).unwrap();
        let bytes = sealed.to_bytes();
        assert_eq!(bytes.len(), NONCE_LEN + TAG_LEN + 6);
        assert_eq!(EncryptedPayload::from_bytes(&bytes).unwrap(), sealed);
        assert!(matches!(
            EncryptedPayload::from_bytes(&bytes[..20]),
            Err(CryptoError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_serde_uses_base64() {
        let sealed = encrypt(b"json", &key()).unwrap();
        let json = serde_json::to_value(&sealed).unwrap();
        assert!(json["nonce"].is_string());
        assert!(json["tag"].is_string());
        let back: EncryptedPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, sealed);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let sealed = encrypt(&payload, &key()).unwrap();
            prop_assert_eq!(sealed.open(&key()).unwrap(), payload);
        }

        #[test]
        fn prop_ciphertext_bit_flip_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut sealed = encrypt(&payload, &key()).unwrap();
            let i = index.index(sealed.ciphertext.len());
            sealed.ciphertext[i] ^= 1 << bit;
            prop_assert_eq!(sealed.open(&key()), Err(CryptoError::Authentication));
        }

        #[test]
        fn prop_tag_bit_flip_detected(
            payload in proptest::collection::vec(any::<u8>(), 0..256),
            index in 0usize..TAG_LEN,
            bit in 0u8..8,
        ) {
            let mut sealed = encrypt(&payload, &key()).unwrap();
            sealed.tag[index] ^= 1 << bit;
            prop_assert_eq!(sealed.open(&key()), Err(CryptoError::Authentication));
        }
    }
}
