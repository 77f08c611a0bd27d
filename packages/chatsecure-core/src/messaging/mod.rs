//! # Messaging Module
//!
//! Composes the cipher, integrity and signing primitives into the record
//! a chat message is persisted as.
//!
//! ## Sealing Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SEALING A MESSAGE                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  body ──┬──► hybrid / group encrypt ──► envelope ─┐                     │
//! │         │                                          │                     │
//! │         │      sender, receiver, timestamp ────────┼──► integrity hash  │
//! │         │                                          │                     │
//! │         └──► ECDSA sign (optional) ──► signature   │                     │
//! │                                                    ▼                     │
//! │                    SealedMessage { envelope, hash, signature }          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The hash covers the envelope text exactly as stored, so batch
//! verification never needs a key. The signature covers the plaintext body
//! and is checked by the reader after decryption.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::crypto::{group, hybrid, signing, GroupKey, PrivateKeyInput};
use crate::error::Result;
use crate::integrity::{self, MessageBinding};

/// An encrypted message as persisted, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    envelope: String,
    integrity_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

impl SealedMessage {
    /// Envelope text (the stored message body)
    pub fn envelope(&self) -> &str {
        &self.envelope
    }

    /// Hex SHA-256 integrity hash
    pub fn integrity_hash(&self) -> &str {
        &self.integrity_hash
    }

    /// Sender's ECDSA signature over the plaintext, if signed
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Whether the stored hash still matches the envelope and metadata
    pub fn verify_integrity(&self, sender: &str, receiver: &str, timestamp: NaiveDateTime) -> bool {
        integrity::verify(
            &MessageBinding::new(&self.envelope, sender, receiver, timestamp),
            &self.integrity_hash,
        )
    }

    /// Decrypt a direct message, returning the envelope on failure
    pub fn open_direct(&self, recipient_private_pem: &str) -> String {
        hybrid::decrypt(&self.envelope, recipient_private_pem)
    }

    /// Decrypt a group message, returning the envelope on failure
    pub fn open_group(&self, key: &GroupKey) -> String {
        group::decrypt(&self.envelope, key)
    }

    /// Check the sender's signature against decrypted plaintext
    ///
    /// Unsigned messages never verify.
    pub fn verify_signature(&self, plaintext: &str, sender_public_pem: &str) -> bool {
        self.signature
            .as_deref()
            .map_or(false, |sig| signing::verify_ecdsa(plaintext, sig, sender_public_pem))
    }
}

/// Seal a direct message for `receiver`
pub fn seal_direct(
    body: &str,
    sender: &str,
    receiver: &str,
    timestamp: NaiveDateTime,
    recipient_public_pem: &str,
    signer: Option<PrivateKeyInput<'_>>,
) -> Result<SealedMessage> {
    let envelope = hybrid::encrypt_for_recipient(body, recipient_public_pem)?;
    finish(body, envelope, sender, receiver, timestamp, signer)
}

/// Seal a message for every member of `group_id`
pub fn seal_group(
    body: &str,
    sender: &str,
    group_id: &str,
    timestamp: NaiveDateTime,
    key: &GroupKey,
    signer: Option<PrivateKeyInput<'_>>,
) -> Result<SealedMessage> {
    let envelope = group::encrypt(body, key)?;
    finish(body, envelope, sender, group_id, timestamp, signer)
}

fn finish(
    body: &str,
    envelope: String,
    sender: &str,
    receiver: &str,
    timestamp: NaiveDateTime,
    signer: Option<PrivateKeyInput<'_>>,
) -> Result<SealedMessage> {
    let integrity_hash = integrity::hash(&MessageBinding::new(&envelope, sender, receiver, timestamp));
    let signature = signer
        .map(|key| signing::sign_ecdsa(body, key))
        .transpose()?;

    tracing::debug!(signed = signature.is_some(), "Sealed message");

    Ok(SealedMessage {
        envelope,
        integrity_hash,
        signature,
    })
}
