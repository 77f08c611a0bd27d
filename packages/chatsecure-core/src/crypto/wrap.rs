//! # At-Rest Key Wrapping
//!
//! Private keys are persisted only after being sealed under a key derived
//! from the application secret.
//!
//! ```text
//! APP_SECRET ──HKDF──► wrap key (AES-256)
//!
//! wrapped = base64( nonce (12) ‖ ciphertext ‖ tag (16) )
//! ```
//!
//! A fresh nonce is drawn for every wrap, so wrapping the same key twice
//! yields different text. The ciphertext is bound to [`WRAPPED_KEY_AAD`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use zeroize::Zeroizing;

use super::encryption::{self, EncryptionKey, Nonce, NONCE_SIZE, TAG_SIZE};
use super::kdf::derive_at_rest_key;
use crate::config::CoreConfig;
use crate::error::{Error, Result};

/// Associated data for wrapped private keys
pub const WRAPPED_KEY_AAD: &[u8] = b"chatsecure/private-key/v1";

/// Seals and opens private key material for storage
///
/// Implemented by [`AtRestCipher`]; alternative backends (an HSM or a cloud
/// KMS) plug in here.
pub trait KeyWrapper: Send + Sync {
    /// Seal plaintext key bytes into storable text
    fn wrap(&self, plaintext: &[u8]) -> Result<String>;

    /// Open text produced by [`KeyWrapper::wrap`]
    fn unwrap(&self, wrapped: &str) -> Result<Zeroizing<Vec<u8>>>;
}

/// AES-256-GCM key wrapper keyed from the application secret
pub struct AtRestCipher {
    key: EncryptionKey,
}

impl AtRestCipher {
    /// Derive the wrapping key from an application secret
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        Ok(Self {
            key: derive_at_rest_key(secret.as_ref())?,
        })
    }

    /// Derive the wrapping key from the configured at-rest secret
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        Self::new(config.at_rest_secret())
    }
}

impl std::fmt::Debug for AtRestCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtRestCipher").finish_non_exhaustive()
    }
}

impl KeyWrapper for AtRestCipher {
    fn wrap(&self, plaintext: &[u8]) -> Result<String> {
        let (nonce, ciphertext) = encryption::encrypt(&self.key, plaintext, WRAPPED_KEY_AAD)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(nonce.as_bytes());
        blob.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(blob))
    }

    fn unwrap(&self, wrapped: &str) -> Result<Zeroizing<Vec<u8>>> {
        let blob = BASE64.decode(wrapped.trim())?;
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::InvalidEnvelope(format!(
                "Wrapped key too short: {} bytes",
                blob.len()
            )));
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce)?;

        encryption::decrypt(&self.key, &nonce, ciphertext, WRAPPED_KEY_AAD).map(Zeroizing::new)
    }
}

/// Wrap private key bytes under a key derived from `secret`
pub fn wrap_private_key(private_key: &[u8], secret: &[u8]) -> Result<String> {
    AtRestCipher::new(secret)?.wrap(private_key)
}

/// Unwrap text produced by [`wrap_private_key`] with the same secret
pub fn unwrap_private_key(wrapped: &str, secret: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    AtRestCipher::new(secret)?.unwrap(wrapped)
}
