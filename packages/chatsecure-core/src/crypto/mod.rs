//! # Cryptography Module
//!
//! All cryptographic primitives used by ChatSecure Core.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CRYPTOGRAPHIC PRIMITIVES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐     │
//! │  │   RSA-2048      │    │   ECDSA P-256   │    │   AES-256-GCM   │     │
//! │  │                 │    │                 │    │                 │     │
//! │  │ Key wrapping    │    │ Message signing │    │ Payload         │     │
//! │  │ (OAEP SHA-256)  │    │ (RFC 6979)      │    │ encryption      │     │
//! │  │ PKCS#1 v1.5 sig │    │                 │    │                 │     │
//! │  └─────────────────┘    └─────────────────┘    └─────────────────┘     │
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐                            │
//! │  │   HKDF-SHA256   │    │   OS CSPRNG     │                            │
//! │  │                 │    │                 │                            │
//! │  │ At-rest key     │    │ Keys, nonces    │                            │
//! │  │ derivation      │    │                 │                            │
//! │  └─────────────────┘    └─────────────────┘                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Implementation |
//! |----------|----------------|
//! | Confidentiality | AES-256-GCM under a fresh key per direct message |
//! | Integrity | GCM authentication tag (128-bit) |
//! | Authentication | RSA PKCS#1 v1.5 / ECDSA P-256 signatures |
//! | Key at rest | AES-256-GCM under an HKDF-derived application key |
//!
//! ## Module Structure
//!
//! - [`keys`] - Keypair generation and user key provisioning
//! - [`wrap`] - At-rest private key wrapping
//! - [`encryption`] - AES-256-GCM primitives
//! - [`envelope`] - Self-describing ciphertext envelope
//! - [`hybrid`] - Direct message cipher (RSA-OAEP + AES-GCM)
//! - [`group`] - Group message cipher (shared AES key)
//! - [`signing`] - RSA and ECDSA signatures
//! - [`kdf`] - Key derivation functions

pub mod encryption;
pub mod envelope;
pub mod group;
pub mod hybrid;
pub mod kdf;
pub mod keys;
pub mod signing;
pub mod wrap;

pub use encryption::{EncryptionKey, Nonce};
pub use envelope::{Envelope, EnvelopeAlgorithm};
pub use group::GroupKey;
pub use hybrid::encrypt_for_recipient;
pub use keys::{
    generate_asymmetric_keypair, provision_user_keys, KeyAlgorithm, Keypair, PrivateKeyInput,
    UserKeyBundle, RSA_KEY_BITS,
};
pub use signing::{sign_ecdsa, sign_rsa, verify_ecdsa, verify_rsa};
pub use wrap::{unwrap_private_key, wrap_private_key, AtRestCipher, KeyWrapper};
