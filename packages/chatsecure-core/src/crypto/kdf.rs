//! # Key Derivation Functions
//!
//! HKDF-SHA256 derivation of symmetric keys from application secrets.
//!
//! ```text
//! APP_SECRET (any length)
//!       │
//!       └──► HKDF(info="chatsecure-at-rest-v1") → At-rest key (AES-256)
//! ```
//!
//! | Aspect | Design Choice |
//! |--------|---------------|
//! | KDF Algorithm | HKDF-SHA256 |
//! | Key Separation | Different `info` strings per purpose |
//! | Version String | "-v1" suffix allows future algorithm upgrades |

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::encryption::{EncryptionKey, KEY_SIZE};
use crate::error::{Error, Result};

/// Domain separation strings for HKDF
pub mod domain {
    /// Domain for the key that wraps private keys at rest
    pub const AT_REST_ENCRYPTION: &[u8] = b"chatsecure-at-rest-v1";
}

/// Derive an AES-256 key from an application secret for a given purpose
pub fn derive_key(secret: &[u8], info: &[u8]) -> Result<EncryptionKey> {
    if secret.is_empty() {
        return Err(Error::KeyDerivationFailed("Secret must not be empty".into()));
    }

    let hkdf = Hkdf::<Sha256>::new(None, secret);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(info, &mut key[..])
        .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;

    Ok(EncryptionKey::from_bytes(*key))
}

/// Derive the key used to wrap private keys at rest
pub fn derive_at_rest_key(secret: &[u8]) -> Result<EncryptionKey> {
    derive_key(secret, domain::AT_REST_ENCRYPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let k1 = derive_at_rest_key(b"app-secret").unwrap();
        let k2 = derive_at_rest_key(b"app-secret").unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_secrets_different_keys() {
        let k1 = derive_at_rest_key(b"secret-1").unwrap();
        let k2 = derive_at_rest_key(b"secret-2").unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_domains_are_separated() {
        let at_rest = derive_at_rest_key(b"app-secret").unwrap();
        let other = derive_key(b"app-secret", b"some-other-purpose").unwrap();

        assert_ne!(at_rest.as_bytes(), other.as_bytes());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(derive_at_rest_key(b"").is_err());
    }
}
