//! [`SharedKey`]: the process-wide envelope key, plus key generation.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use super::envelope::{EnvelopeError, KEY_LEN};

/// Random bytes behind a generated key string. 24 bytes encode to exactly
/// [`KEY_LEN`] URL-safe base64 characters.
const GENERATED_ENTROPY_LEN: usize = 24;

/// Number of leading key characters exposed by [`fingerprint`].
pub const FINGERPRINT_CHARS: usize = 8;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Loaded once at startup and shared read-only for the process lifetime.
/// The bytes are overwritten with zeroes on drop.
pub struct SharedKey(Box<[u8; KEY_LEN]>);

impl SharedKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidKeyLength`] if `bytes` is not [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() != KEY_LEN {
            return Err(EnvelopeError::InvalidKeyLength(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Raw key bytes for the codec.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for SharedKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("SharedKey([REDACTED])")
    }
}

/// Generate a fresh key string of exactly [`KEY_LEN`] ASCII characters.
///
/// The string's bytes are the key, so callers that hold the same string can
/// use it directly as an AES-256 key.
///
/// # Errors
///
/// Returns [`EnvelopeError::RandomSource`] if the OS random source fails.
pub fn generate_key_string() -> Result<String, EnvelopeError> {
    let mut entropy = [0u8; GENERATED_ENTROPY_LEN];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|_| EnvelopeError::RandomSource)?;
    let key = URL_SAFE_NO_PAD.encode(entropy);
    entropy.iter_mut().for_each(|b| *b = 0);
    Ok(key)
}

/// Masked key fingerprint: the first [`FINGERPRINT_CHARS`] characters and `...`.
pub fn fingerprint(key: &str) -> String {
    let head: String = key.chars().take(FINGERPRINT_CHARS).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_is_key_len_ascii() {
        let key = generate_key_string().unwrap();
        assert_eq!(key.len(), KEY_LEN);
        assert!(key.is_ascii());
        assert!(SharedKey::from_bytes(key.as_bytes()).is_ok());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_key_string().unwrap(), generate_key_string().unwrap());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            SharedKey::from_bytes(&[0u8; 16]),
            Err(EnvelopeError::InvalidKeyLength(16))
        ));
        assert!(SharedKey::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn as_bytes_round_trips() {
        let key = SharedKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap();
        assert_eq!(key.as_bytes(), &[0x42u8; KEY_LEN][..]);
    }

    #[test]
    fn redacted_in_debug() {
        let key = SharedKey::from_bytes(b"0123456789abcdef0123456789abcdef").unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("0123"));
    }

    #[test]
    fn fingerprint_masks_tail() {
        assert_eq!(fingerprint("9__dHEdhjcXhhBlji2aGs1DZvn1p3v6t"), "9__dHEdh...");
        assert_eq!(fingerprint("abc"), "abc...");
    }
}
