//! Password-sealed envelopes.
//!
//! An envelope carries everything needed to re-derive the key and decrypt,
//! except the password: salt, iteration count, nonce, tag, and ciphertext.
//! This is the format client-originated encrypted bodies arrive in.

use serde::{Deserialize, Serialize};

use crate::cipher::{self, EncryptedPayload, NONCE_LEN, TAG_LEN};
use crate::encoding::{self, base64_bytes};
use crate::error::CryptoError;
use crate::kdf::KeyDeriver;

/// Minimum accepted salt length in decoded bytes.
pub const MIN_ENVELOPE_SALT_LEN: usize = 16;

/// Ciphertext sealed under a password-derived key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordEnvelope {
    /// KDF salt.
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// KDF iteration count.
    pub iterations: u32,
    /// The AEAD triple.
    #[serde(flatten)]
    pub payload: EncryptedPayload,
}

/// Derives a key from `password` with a fresh salt and seals `data` under it.
pub fn encrypt_with_password(
    data: &[u8],
    password: &str,
    deriver: &KeyDeriver,
) -> Result<PasswordEnvelope, CryptoError> {
    let derived = deriver.derive(password.as_bytes(), None)?;
    let payload = cipher::encrypt(data, &derived.key)?;
    Ok(PasswordEnvelope {
        salt: derived.salt,
        iterations: derived.iterations,
        payload,
    })
}

/// Re-derives the key from `password` and opens `envelope`.
///
/// A wrong password is reported as [`CryptoError::Authentication`], the
/// same as a tampered envelope.
pub fn decrypt_with_password(
    envelope: &PasswordEnvelope,
    password: &str,
) -> Result<Vec<u8>, CryptoError> {
    if envelope.salt.len() < MIN_ENVELOPE_SALT_LEN {
        return Err(CryptoError::malformed(format!(
            "salt must be at least {MIN_ENVELOPE_SALT_LEN} bytes, got {}",
            envelope.salt.len()
        )));
    }
    let deriver = KeyDeriver::new(envelope.iterations, envelope.salt.len());
    let derived = deriver.derive(password.as_bytes(), Some(&envelope.salt))?;
    envelope.payload.open(&derived.key)
}

/// Checks base64-encoded nonce, tag, and salt metadata sent by a client.
pub fn validate_envelope_metadata(
    nonce_b64: &str,
    tag_b64: &str,
    salt_b64: &str,
) -> Result<(), CryptoError> {
    let nonce = encoding::decode(nonce_b64)?;
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::malformed(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }

    let tag = encoding::decode(tag_b64)?;
    if tag.len() != TAG_LEN {
        return Err(CryptoError::malformed(format!(
            "tag must be {TAG_LEN} bytes, got {}",
            tag.len()
        )));
    }

    let salt = encoding::decode(salt_b64)?;
    if salt.len() < MIN_ENVELOPE_SALT_LEN {
        return Err(CryptoError::malformed(format!(
            "salt must be at least {MIN_ENVELOPE_SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deriver() -> KeyDeriver {
        KeyDeriver::new(50, 16)
    }

    #[test]
    fn test_roundtrip() {
        let envelope = encrypt_with_password(b"file body", "hunter2", &deriver()).unwrap();
        assert_eq!(envelope.salt.len(), 16);
        assert_eq!(envelope.iterations, 50);
        let plain = decrypt_with_password(&envelope, "hunter2").unwrap();
        assert_eq!(plain, b"file body");
    }

    #[test]
    fn test_wrong_password_is_indistinguishable_from_tamper() {
        let envelope = encrypt_with_password(b"file body", "hunter2", &deriver()).unwrap();
        let wrong = decrypt_with_password(&envelope, "hunter3").unwrap_err();

        let mut tampered = envelope.clone();
        tampered.payload.ciphertext[0] ^= 0x80;
        let corrupt = decrypt_with_password(&tampered, "hunter2").unwrap_err();

        assert_eq!(wrong, CryptoError::Authentication);
        assert_eq!(wrong, corrupt);
        assert_eq!(wrong.to_string(), corrupt.to_string());
    }

    #[test]
    fn test_json_shape() {
        let envelope = encrypt_with_password(b"", "pw", &deriver()).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        for field in ["salt", "iterations", "nonce", "tag", "ciphertext"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        let back: PasswordEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_validate_metadata() {
        let nonce = encoding::encode(&[1u8; 12]);
        let tag = encoding::encode(&[3u8; 16]);
        let salt = encoding::encode(&[2u8; 16]);
        assert!(validate_envelope_metadata(&nonce, &tag, &salt).is_ok());

        let short_nonce = encoding::encode(&[1u8; 8]);
        assert!(matches!(
            validate_envelope_metadata(&short_nonce, &tag, &salt),
            Err(CryptoError::MalformedInput(_))
        ));
        let long_tag = encoding::encode(&[3u8; 17]);
        assert!(matches!(
            validate_envelope_metadata(&nonce, &long_tag, &salt),
            Err(CryptoError::MalformedInput(_))
        ));
        let short_salt = encoding::encode(&[2u8; 8]);
        assert!(matches!(
            validate_envelope_metadata(&nonce, &tag, &short_salt),
            Err(CryptoError::MalformedInput(_))
        ));
        assert!(matches!(
            validate_envelope_metadata("%%%", &tag, &salt),
            Err(CryptoError::MalformedInput(_))
        ));
    }
}
