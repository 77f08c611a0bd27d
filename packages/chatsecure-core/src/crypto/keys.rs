//! # Key Management
//!
//! Per-user asymmetric key provisioning.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  RSA (2048-bit, e = 65537)                                      │   │
//! │  │  ─────────────────────────                                       │   │
//! │  │  • Wrapping per-message AES keys (RSA-OAEP, SHA-256)            │   │
//! │  │  • PKCS#1 v1.5 signatures                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  ECC (NIST P-256)                                               │   │
//! │  │  ─────────────────                                               │   │
//! │  │  • Deterministic ECDSA signatures                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Format:                                                                │
//! │  • Public key:  SubjectPublicKeyInfo PEM, stored in clear              │
//! │  • Private key: PKCS#8 PEM, only ever persisted wrapped (see `wrap`)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use p256::pkcs8::{
    DecodePrivateKey as _, DecodePublicKey as _, EncodePrivateKey as _, EncodePublicKey as _,
    LineEnding as EcLineEnding,
};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::wrap::KeyWrapper;
use crate::error::{Error, Result};

/// RSA modulus size in bits
pub const RSA_KEY_BITS: usize = 2048;

/// Asymmetric algorithm family of a keypair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyAlgorithm {
    /// RSA with a 2048-bit modulus
    Rsa,
    /// ECDSA over NIST P-256
    Ecc,
}

/// A freshly generated asymmetric keypair
///
/// ## Security
///
/// - The private key is zeroized when this struct is dropped
/// - `Debug` never prints the private key
/// - Persist the private key only through [`KeyWrapper::wrap`]
#[derive(ZeroizeOnDrop)]
pub struct Keypair {
    /// Algorithm family
    #[zeroize(skip)]
    pub algorithm: KeyAlgorithm,
    /// Public key as SPKI PEM (safe to store and share)
    #[zeroize(skip)]
    pub public_key: String,
    /// Private key as PKCS#8 PEM
    private_key: Zeroizing<String>,
}

impl Keypair {
    /// Get the private key PEM
    ///
    /// ## Security Warning
    ///
    /// Only use this to wrap, sign or decrypt. Never log or persist these
    /// bytes unencrypted.
    pub fn private_key_pem(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("algorithm", &self.algorithm)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Generate a new asymmetric keypair
///
/// Uses the operating system's secure random number generator. Fails only
/// when entropy or the underlying library fails.
pub fn generate_asymmetric_keypair(algorithm: KeyAlgorithm) -> Result<Keypair> {
    let (public_key, private_key) = match algorithm {
        KeyAlgorithm::Rsa => generate_rsa()?,
        KeyAlgorithm::Ecc => generate_ecc()?,
    };

    tracing::debug!(?algorithm, "Generated asymmetric keypair");

    Ok(Keypair {
        algorithm,
        public_key,
        private_key,
    })
}

fn generate_rsa() -> Result<(String, Zeroizing<String>)> {
    let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| Error::KeyGenerationFailed(format!("RSA: {}", e)))?;

    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| Error::KeyGenerationFailed(format!("RSA private key encoding: {}", e)))?;
    let public_pem = private
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::KeyGenerationFailed(format!("RSA public key encoding: {}", e)))?;

    Ok((public_pem, private_pem))
}

fn generate_ecc() -> Result<(String, Zeroizing<String>)> {
    let secret = p256::SecretKey::random(&mut OsRng);

    let private_pem = secret
        .to_pkcs8_pem(EcLineEnding::LF)
        .map_err(|e| Error::KeyGenerationFailed(format!("ECC private key encoding: {}", e)))?;
    let public_pem = secret
        .public_key()
        .to_public_key_pem(EcLineEnding::LF)
        .map_err(|e| Error::KeyGenerationFailed(format!("ECC public key encoding: {}", e)))?;

    Ok((public_pem, private_pem))
}

// ============================================================================
// KEY LOADING
// ============================================================================

/// Encoding of an ECDSA private key handed to [`super::sign_ecdsa`]
#[derive(Debug, Clone, Copy)]
pub enum PrivateKeyInput<'a> {
    /// PKCS#8 or SEC1 PEM text
    Pem(&'a str),
    /// PKCS#8 or SEC1 DER bytes
    Der(&'a [u8]),
}

pub(crate) fn load_rsa_private_key(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|_| Error::InvalidKey("Unrecognized RSA private key".into()))
}

pub(crate) fn load_rsa_public_key(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|_| Error::InvalidKey("Unrecognized RSA public key".into()))
}

pub(crate) fn load_ec_signing_key(input: PrivateKeyInput<'_>) -> Result<p256::ecdsa::SigningKey> {
    let loaded = match input {
        PrivateKeyInput::Pem(pem) => p256::ecdsa::SigningKey::from_pkcs8_pem(pem)
            .ok()
            .or_else(|| p256::SecretKey::from_sec1_pem(pem).ok().map(Into::into)),
        PrivateKeyInput::Der(der) => p256::ecdsa::SigningKey::from_pkcs8_der(der)
            .ok()
            .or_else(|| p256::SecretKey::from_sec1_der(der).ok().map(Into::into)),
    };

    loaded.ok_or_else(|| Error::InvalidKey("Unrecognized ECC private key".into()))
}

pub(crate) fn load_ec_verifying_key(pem: &str) -> Result<p256::ecdsa::VerifyingKey> {
    p256::ecdsa::VerifyingKey::from_public_key_pem(pem)
        .map_err(|_| Error::InvalidKey("Unrecognized ECC public key".into()))
}

// ============================================================================
// USER PROVISIONING
// ============================================================================

/// The key material created for a user at signup
///
/// Public keys are in clear; private keys are wrapped at rest and can be
/// stored as-is by the persistence layer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct UserKeyBundle {
    /// RSA public key (SPKI PEM)
    pub rsa_public_key: String,
    /// Wrapped RSA private key
    pub rsa_private_key_wrapped: String,
    /// ECC public key (SPKI PEM)
    pub ecc_public_key: String,
    /// Wrapped ECC private key
    pub ecc_private_key_wrapped: String,
}

impl fmt::Debug for UserKeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKeyBundle")
            .field("rsa_public_key", &self.rsa_public_key)
            .field("ecc_public_key", &self.ecc_public_key)
            .finish_non_exhaustive()
    }
}

/// Generate and wrap the RSA and ECC keypairs for a new user
///
/// The plaintext private keys never leave this function.
pub fn provision_user_keys(wrapper: &dyn KeyWrapper) -> Result<UserKeyBundle> {
    let rsa = generate_asymmetric_keypair(KeyAlgorithm::Rsa)?;
    let ecc = generate_asymmetric_keypair(KeyAlgorithm::Ecc)?;

    let bundle = UserKeyBundle {
        rsa_private_key_wrapped: wrapper.wrap(rsa.private_key_pem().as_bytes())?,
        ecc_private_key_wrapped: wrapper.wrap(ecc.private_key_pem().as_bytes())?,
        rsa_public_key: rsa.public_key.clone(),
        ecc_public_key: ecc.public_key.clone(),
    };

    tracing::info!("Provisioned RSA and ECC keypairs");
    Ok(bundle)
}

// ============================================================================
// TESTS
// ============================================================================
