//! AES-256-GCM envelope sealing and opening.
//!
//! **Nonce discipline:** every [`seal`] call draws a fresh 96-bit nonce from
//! the OS CSPRNG. GCM nonce reuse under one key breaks both confidentiality
//! and authentication, so no counter or cached nonce is ever used.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Errors produced by the envelope codec.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The OS random source could not supply a nonce.
    #[error("secure random source unavailable")]
    RandomSource,

    /// The envelope is not valid standard base64.
    #[error("envelope is not valid base64")]
    Decode,

    /// The decoded envelope is too short to contain a nonce.
    #[error("envelope truncated: {0} bytes is shorter than the {NONCE_LEN}-byte nonce")]
    Truncated(usize),

    /// Tag verification failed. Deliberately carries no cause.
    #[error("decryption failed")]
    Authentication,

    /// AES-GCM refused to encrypt (plaintext exceeds the GCM length limit).
    #[error("aead encryption failed")]
    Encryption,
}

/// Seal `plaintext` under `key` into a base64 envelope.
///
/// The envelope is `base64(nonce || ciphertext || tag)` using the standard,
/// padded alphabet.
///
/// # Errors
///
/// Returns [`EnvelopeError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes
/// and [`EnvelopeError::RandomSource`] if no nonce can be drawn.
pub fn seal(plaintext: &[u8], key: &[u8]) -> Result<String, EnvelopeError> {
    let cipher = build_cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| EnvelopeError::RandomSource)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| EnvelopeError::Encryption)?;

    let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    raw.extend_from_slice(&nonce_bytes);
    raw.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(raw))
}

/// Open a base64 envelope produced by [`seal`] and return the plaintext.
///
/// No plaintext is returned unless the tag verifies.
///
/// # Errors
///
/// - [`EnvelopeError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// - [`EnvelopeError::Decode`] if `envelope` is not valid base64.
/// - [`EnvelopeError::Truncated`] if the decoded bytes cannot hold a nonce.
/// - [`EnvelopeError::Authentication`] on any tag mismatch: wrong key,
///   tampered bytes, or a ciphertext too short to hold a tag.
pub fn open(envelope: &str, key: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = build_cipher(key)?;

    let raw = STANDARD
        .decode(envelope.trim())
        .map_err(|_| EnvelopeError::Decode)?;
    if raw.len() < NONCE_LEN {
        return Err(EnvelopeError::Truncated(raw.len()));
    }

    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EnvelopeError::Authentication)
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, EnvelopeError> {
    if key.len() != KEY_LEN {
        return Err(EnvelopeError::InvalidKeyLength(key.len()));
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| EnvelopeError::InvalidKeyLength(key.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_LEN: usize = 16;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn seal_open_round_trip() {
        let key = random_key();
        let plaintext = br#"{"company_name":"Acme","quota_gb":10}"#;
        let envelope = seal(plaintext, &key).unwrap();
        assert_eq!(open(&envelope, &key).unwrap(), plaintext);
    }

    #[test]
    fn round_trip_empty_and_binary_payloads() {
        let key = random_key();
        let binary: Vec<u8> = (0..=255u8).collect();
        for payload in [&b""[..], &binary[..]] {
            let envelope = seal(payload, &key).unwrap();
            assert_eq!(open(&envelope, &key).unwrap(), payload);
        }
    }

    #[test]
    fn envelope_layout() {
        let key = random_key();
        let envelope = seal(b"hello", &key).unwrap();
        let raw = STANDARD.decode(&envelope).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 5 + TAG_LEN);
    }

    #[test]
    fn sealing_twice_differs() {
        let key = random_key();
        let a = seal(b"same", &key).unwrap();
        let b = seal(b"same", &key).unwrap();
        assert_ne!(a, b);
        assert_eq!(open(&a, &key).unwrap(), open(&b, &key).unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let envelope = seal(b"secret", &random_key()).unwrap();
        assert!(matches!(
            open(&envelope, &random_key()),
            Err(EnvelopeError::Authentication)
        ));
    }

    #[test]
    fn every_flipped_byte_fails_auth() {
        let key = random_key();
        let envelope = seal(b"tamper me", &key).unwrap();
        let raw = STANDARD.decode(&envelope).unwrap();
        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let res = open(&STANDARD.encode(&tampered), &key);
            assert!(
                matches!(res, Err(EnvelopeError::Authentication)),
                "byte {i} flip was not rejected"
            );
        }
    }

    #[test]
    fn bad_key_lengths_rejected() {
        for len in [0, 16, 31, 33] {
            let key = vec![0x42u8; len];
            assert!(matches!(
                seal(b"x", &key),
                Err(EnvelopeError::InvalidKeyLength(n)) if n == len
            ));
            assert!(matches!(
                open("AAAA", &key),
                Err(EnvelopeError::InvalidKeyLength(n)) if n == len
            ));
        }
    }

    #[test]
    fn non_base64_is_decode_error() {
        let key = random_key();
        assert!(matches!(
            open("not base64 at all!!", &key),
            Err(EnvelopeError::Decode)
        ));
    }

    #[test]
    fn short_envelope_is_truncated() {
        let key = random_key();
        let short = STANDARD.encode([0u8; NONCE_LEN - 1]);
        assert!(matches!(
            open(&short, &key),
            Err(EnvelopeError::Truncated(11))
        ));
    }

    #[test]
    fn nonce_without_tag_fails_auth() {
        let key = random_key();
        let nonce_only = STANDARD.encode([0u8; NONCE_LEN + 4]);
        assert!(matches!(
            open(&nonce_only, &key),
            Err(EnvelopeError::Authentication)
        ));
    }

    #[test]
    fn auth_error_message_is_generic() {
        assert_eq!(EnvelopeError::Authentication.to_string(), "decryption failed");
    }
}
