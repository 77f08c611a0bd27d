//! # Hybrid Cipher
//!
//! Direct message encryption: a fresh AES-256-GCM key per message, wrapped
//! for the recipient with RSA-OAEP (SHA-256).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DIRECT MESSAGE ENCRYPTION                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  plaintext ──► AES-256-GCM(K, nonce) ──► ct ‖ tag                       │
//! │                       ▲                                                 │
//! │  K (random) ──────────┴──► RSA-OAEP(recipient public key) ──► wk        │
//! │                                                                         │
//! │  envelope = { wk, iv: nonce, ct, tag }                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rand::rngs::OsRng;
use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::encryption::{self, EncryptionKey};
use super::envelope::{Envelope, EnvelopeAlgorithm};
use super::keys::{load_rsa_private_key, load_rsa_public_key};
use crate::error::{Error, Result};

/// Encrypt a message for the holder of `recipient_public_pem`
///
/// Every call draws a new symmetric key and nonce.
pub fn encrypt_for_recipient(plaintext: &str, recipient_public_pem: &str) -> Result<String> {
    let public = load_rsa_public_key(recipient_public_pem)?;
    let key = EncryptionKey::generate();

    let aad = EnvelopeAlgorithm::RsaOaepAesGcm.header_aad();
    let (nonce, sealed) = encryption::encrypt(&key, plaintext.as_bytes(), &aad)?;
    let wrapped_key = public
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
        .map_err(|e| Error::EncryptionFailed(format!("Key wrapping failed: {}", e)))?;

    Envelope::seal(EnvelopeAlgorithm::RsaOaepAesGcm, Some(wrapped_key), nonce, sealed)?.encode()
}

/// Decrypt an envelope, reporting why it could not be opened
pub fn try_decrypt(envelope: &str, private_pem: &str) -> Result<String> {
    let envelope = Envelope::decode(envelope, EnvelopeAlgorithm::RsaOaepAesGcm)?;
    let private = load_rsa_private_key(private_pem)?;

    let wrapped_key = envelope
        .wrapped_key
        .as_deref()
        .ok_or_else(|| Error::InvalidEnvelope("Missing wrapped key".into()))?;
    let key_bytes = Zeroizing::new(
        private
            .decrypt(Oaep::new::<Sha256>(), wrapped_key)
            .map_err(|_| Error::DecryptionFailed("Key unwrapping failed".into()))?,
    );
    let key = EncryptionKey::from_slice(&key_bytes)?;

    let plaintext = encryption::decrypt(
        &key,
        &envelope.nonce,
        &envelope.sealed_payload(),
        &envelope.header_aad(),
    )?;
    String::from_utf8(plaintext)
        .map_err(|_| Error::DecryptionFailed("Plaintext is not valid UTF-8".into()))
}

/// Decrypt an envelope, returning the envelope text unchanged on failure
///
/// This is fail-soft on purpose: callers store and display whatever comes
/// back, so a tampered, truncated or foreign envelope yields the literal
/// stored value instead of an error. It never yields forged plaintext. Use
/// [`try_decrypt`] to distinguish the failure.
pub fn decrypt(envelope: &str, private_pem: &str) -> String {
    match try_decrypt(envelope, private_pem) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            tracing::debug!(code = e.code(), "Direct message decryption failed, returning input");
            envelope.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{generate_asymmetric_keypair, KeyAlgorithm, Keypair};
    use once_cell::sync::Lazy;

    static ALICE: Lazy<Keypair> =
        Lazy::new(|| generate_asymmetric_keypair(KeyAlgorithm::Rsa).unwrap());
    static BOB: Lazy<Keypair> =
        Lazy::new(|| generate_asymmetric_keypair(KeyAlgorithm::Rsa).unwrap());

    #[test]
    fn test_round_trip() {
        let envelope = encrypt_for_recipient("hello", &ALICE.public_key).unwrap();

        assert_ne!(envelope, "hello");
        assert_eq!(decrypt(&envelope, ALICE.private_key_pem()), "hello");
    }

    #[test]
    fn test_unicode_and_empty() {
        for text in ["", "héllo wörld 👋", "line\nbreak"] {
            let envelope = encrypt_for_recipient(text, &ALICE.public_key).unwrap();
            assert_eq!(try_decrypt(&envelope, ALICE.private_key_pem()).unwrap(), text);
        }
    }

    #[test]
    fn test_fresh_randomness_per_message() {
        let e1 = encrypt_for_recipient("same", &ALICE.public_key).unwrap();
        let e2 = encrypt_for_recipient("same", &ALICE.public_key).unwrap();

        assert_ne!(e1, e2);
    }

    #[test]
    fn test_wrong_recipient_gets_envelope_back() {
        let envelope = encrypt_for_recipient("for alice", &ALICE.public_key).unwrap();

        assert_eq!(decrypt(&envelope, BOB.private_key_pem()), envelope);
        assert!(matches!(
            try_decrypt(&envelope, BOB.private_key_pem()),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_corrupted_envelope_returned_verbatim() {
        let envelope = encrypt_for_recipient("hello", &ALICE.public_key).unwrap();
        let mut corrupted: Vec<char> = envelope.chars().collect();
        let mid = corrupted.len() / 2;
        corrupted[mid] = if corrupted[mid] == 'A' { 'B' } else { 'A' };
        let corrupted: String = corrupted.into_iter().collect();

        assert_eq!(decrypt(&corrupted, ALICE.private_key_pem()), corrupted);
    }

    #[test]
    fn test_malformed_inputs_are_fail_soft() {
        assert_eq!(decrypt("plain text", ALICE.private_key_pem()), "plain text");
        assert_eq!(decrypt("", ALICE.private_key_pem()), "");

        let envelope = encrypt_for_recipient("hi", &ALICE.public_key).unwrap();
        assert_eq!(decrypt(&envelope, "not a key"), envelope);
    }

    #[test]
    fn test_bad_public_key_is_error() {
        assert!(matches!(
            encrypt_for_recipient("hi", "garbage"),
            Err(Error::InvalidKey(_))
        ));
    }
}
