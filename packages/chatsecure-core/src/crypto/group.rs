//! # Group Cipher
//!
//! Group messages are encrypted under a 256-bit key shared by all members.
//! The envelope is the same as for direct messages, minus the wrapped key.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::encryption::{self, EncryptionKey, KEY_SIZE};
use super::envelope::{Envelope, EnvelopeAlgorithm};
use crate::error::{Error, Result};

/// A group's shared AES-256 key
///
/// Generated once at group creation and persisted by the caller as raw
/// bytes. Zeroized when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct GroupKey([u8; KEY_SIZE]);

impl GroupKey {
    /// Generate a new random group key
    pub fn generate() -> Self {
        Self(*EncryptionKey::generate().as_bytes())
    }

    /// Load a stored group key
    ///
    /// Anything other than exactly 32 bytes is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Raw key bytes for storage
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    fn cipher_key(&self) -> EncryptionKey {
        EncryptionKey::from_bytes(self.0)
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GroupKey(<redacted>)")
    }
}

/// Encrypt a message under a group key
pub fn encrypt(plaintext: &str, key: &GroupKey) -> Result<String> {
    let aad = EnvelopeAlgorithm::AesGcm.header_aad();
    let (nonce, sealed) = encryption::encrypt(&key.cipher_key(), plaintext.as_bytes(), &aad)?;
    Envelope::seal(EnvelopeAlgorithm::AesGcm, None, nonce, sealed)?.encode()
}

/// Encrypt under raw stored key bytes, failing on any length but 32
pub fn encrypt_with_key_bytes(plaintext: &str, key: &[u8]) -> Result<String> {
    encrypt(plaintext, &GroupKey::from_slice(key)?)
}

/// Decrypt a group envelope, reporting why it could not be opened
pub fn try_decrypt(envelope: &str, key: &GroupKey) -> Result<String> {
    let envelope = Envelope::decode(envelope, EnvelopeAlgorithm::AesGcm)?;
    let plaintext = encryption::decrypt(
        &key.cipher_key(),
        &envelope.nonce,
        &envelope.sealed_payload(),
        &envelope.header_aad(),
    )?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::DecryptionFailed("Plaintext is not valid UTF-8".into()))
}

/// Decrypt a group envelope, returning the envelope text unchanged on failure
///
/// Fail-soft like [`super::hybrid::decrypt`]: the caller gets back the
/// literal stored value, never forged plaintext and never an error.
pub fn decrypt(envelope: &str, key: &GroupKey) -> String {
    match try_decrypt(envelope, key) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            tracing::debug!(code = e.code(), "Group message decryption failed, returning input");
            envelope.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let key = GroupKey::generate();
        let envelope = encrypt("hello group", &key).unwrap();

        assert_eq!(decrypt(&envelope, &key), "hello group");
    }

    #[test]
    fn test_nonce_unique_per_message() {
        let key = GroupKey::generate();
        assert_ne!(encrypt("x", &key).unwrap(), encrypt("x", &key).unwrap());
    }

    #[test]
    fn test_wrong_key_returns_envelope() {
        let envelope = encrypt("secret", &GroupKey::generate()).unwrap();
        let other = GroupKey::generate();

        assert_eq!(decrypt(&envelope, &other), envelope);
        assert!(matches!(
            try_decrypt(&envelope, &other),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        for len in [0usize, 16, 31, 33, 64] {
            let bytes = vec![1u8; len];
            assert!(matches!(
                GroupKey::from_slice(&bytes),
                Err(Error::InvalidKeyLength { expected: 32, actual }) if actual == len
            ));
            assert!(encrypt_with_key_bytes("x", &bytes).is_err());
        }
    }

    #[test]
    fn test_stored_key_bytes_round_trip() {
        let key = GroupKey::generate();
        let stored = key.as_bytes().to_vec();

        let envelope = encrypt_with_key_bytes("persisted", &stored).unwrap();
        let reloaded = GroupKey::from_slice(&stored).unwrap();
        assert_eq!(reloaded, key);
        assert_eq!(decrypt(&envelope, &reloaded), "persisted");
    }

    #[test]
    fn test_payload_bound_to_header() {
        let key = GroupKey::generate();
        let text = encrypt("bound", &key).unwrap();
        let envelope = Envelope::decode(&text, EnvelopeAlgorithm::AesGcm).unwrap();
        let payload = envelope.sealed_payload();

        assert!(encryption::decrypt(&key.cipher_key(), &envelope.nonce, &payload, &[]).is_err());
        assert!(encryption::decrypt(
            &key.cipher_key(),
            &envelope.nonce,
            &payload,
            &EnvelopeAlgorithm::RsaOaepAesGcm.header_aad(),
        )
        .is_err());
        assert_eq!(
            encryption::decrypt(&key.cipher_key(), &envelope.nonce, &payload, &envelope.header_aad())
                .unwrap(),
            b"bound"
        );
    }

    #[test]
    fn test_direct_envelope_not_accepted() {
        let key = GroupKey::generate();
        assert_eq!(decrypt("not an envelope", &key), "not an envelope");
    }

    #[test]
    fn test_debug_is_redacted() {
        assert_eq!(format!("{:?}", GroupKey::generate()), "GroupKey(<redacted>)");
    }
}
