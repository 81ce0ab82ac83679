//! SHA-256 content digests.
//!
//! Digests are not secret, so verification is a plain comparison.

use std::io::Read;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `bytes` (64 lowercase characters).
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex-encoded SHA-256 of everything read from `reader`, in 64 KiB chunks.
pub fn checksum_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Recomputes the digest of `bytes` and compares it with `expected`.
///
/// Hex case in `expected` is ignored.
pub fn verify_checksum(bytes: &[u8], expected: &str) -> bool {
    checksum(bytes).eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(checksum(b"").len(), 64);
    }

    #[test]
    fn test_reader_matches_slice() {
        let data = vec![0x5Au8; 200_000];
        let streamed = checksum_reader(&data[..]).unwrap();
        assert_eq!(streamed, checksum(&data));
    }

    #[test]
    fn test_verify() {
        let digest = checksum(b"artifact");
        assert!(verify_checksum(b"artifact", &digest));
        assert!(verify_checksum(b"artifact", &digest.to_uppercase()));
        assert!(!verify_checksum(b"artifact!", &digest));
    }
}
