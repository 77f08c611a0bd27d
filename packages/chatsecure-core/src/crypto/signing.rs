//! # Digital Signatures Module
//!
//! RSA and ECDSA signatures over UTF-8 message text.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SIGNATURE SCHEMES                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  RSA                                                                    │
//! │  ───                                                                    │
//! │  SHA-256 digest ──► PKCS#1 v1.5 ──► 256-byte signature ──► base64       │
//! │                                                                         │
//! │  ECDSA (P-256)                                                          │
//! │  ─────────────                                                          │
//! │  SHA-256 digest ──► RFC 6979 deterministic nonce ──► r ‖ s (64 bytes)   │
//! │                 ──► encoding::bytes_to_text                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Verification Never Fails Loudly
//!
//! `verify_rsa` and `verify_ecdsa` take attacker-controlled input. A
//! malformed signature, a malformed key or a mismatched message all produce
//! `false`; nothing panics and nothing is returned as an error.

use p256::ecdsa::signature::{Signer as _, Verifier as _};
use rsa::pkcs1v15;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha256;

use super::keys::{
    load_ec_signing_key, load_ec_verifying_key, load_rsa_private_key, load_rsa_public_key,
    PrivateKeyInput,
};
use crate::encoding::{bytes_to_text, text_to_bytes};
use crate::error::{Error, Result};

/// Size of a raw P-256 ECDSA signature (r ‖ s)
pub const ECDSA_SIGNATURE_SIZE: usize = 64;

// ============================================================================
// RSA
// ============================================================================

/// Sign a message with an RSA private key (PKCS#1 v1.5, SHA-256)
///
/// Returns the signature as base64 text.
pub fn sign_rsa(message: &str, private_pem: &str) -> Result<String> {
    let signing_key = pkcs1v15::SigningKey::<Sha256>::new(load_rsa_private_key(private_pem)?);

    let signature = signing_key
        .try_sign(message.as_bytes())
        .map_err(|e| Error::SigningFailed(format!("RSA: {}", e)))?;

    Ok(bytes_to_text(signature.to_vec().as_slice()))
}

/// Verify an RSA signature produced by [`sign_rsa`]
pub fn verify_rsa(message: &str, signature: &str, public_pem: &str) -> bool {
    let Ok(public) = load_rsa_public_key(public_pem) else {
        tracing::debug!("RSA verification rejected: malformed public key");
        return false;
    };
    let Ok(raw) = text_to_bytes(signature) else {
        tracing::debug!("RSA verification rejected: malformed signature encoding");
        return false;
    };
    let Ok(signature) = pkcs1v15::Signature::try_from(raw.as_slice()) else {
        return false;
    };

    pkcs1v15::VerifyingKey::<Sha256>::new(public)
        .verify(message.as_bytes(), &signature)
        .is_ok()
}

// ============================================================================
// ECDSA
// ============================================================================

/// Sign a message with a P-256 private key
///
/// The key may be PEM text or DER bytes. Signatures are deterministic: the
/// same key and message always produce the same output.
pub fn sign_ecdsa(message: &str, private_key: PrivateKeyInput<'_>) -> Result<String> {
    let signing_key = load_ec_signing_key(private_key)?;

    let signature: p256::ecdsa::Signature = signing_key
        .try_sign(message.as_bytes())
        .map_err(|e| Error::SigningFailed(format!("ECDSA: {}", e)))?;

    Ok(bytes_to_text(signature.to_bytes().as_slice()))
}

/// Verify an ECDSA signature produced by [`sign_ecdsa`]
pub fn verify_ecdsa(message: &str, signature: &str, public_pem: &str) -> bool {
    let Ok(verifying_key) = load_ec_verifying_key(public_pem) else {
        tracing::debug!("ECDSA verification rejected: malformed public key");
        return false;
    };
    let Ok(raw) = text_to_bytes(signature) else {
        tracing::debug!("ECDSA verification rejected: malformed signature encoding");
        return false;
    };
    if raw.len() != ECDSA_SIGNATURE_SIZE {
        return false;
    }
    let Ok(signature) = p256::ecdsa::Signature::from_slice(&raw) else {
        return false;
    };

    verifying_key.verify(message.as_bytes(), &signature).is_ok()
}

// ============================================================================
// TESTS
// ============================================================================
