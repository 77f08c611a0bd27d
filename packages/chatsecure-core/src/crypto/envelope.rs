//! # Ciphertext Envelope
//!
//! Self-describing text container shared by the direct and group ciphers.
//!
//! ```text
//! base64( {"v":1,"alg":"RSA-OAEP-256+A256GCM","wk":"..","iv":"..","ct":"..","tag":".."} )
//!
//!   v    format version (always 1)
//!   alg  RSA-OAEP-256+A256GCM (direct) | A256GCM (group)
//!   wk   RSA-OAEP wrapped AES key, absent for group envelopes
//!   iv   96-bit AES-GCM nonce
//!   ct   ciphertext without tag
//!   tag  128-bit authentication tag
//! ```
//!
//! Binary fields are standard base64. Decryption needs nothing beyond the
//! envelope text and the private or group key.
//!
//! The header (`v` and `alg`) is authenticated as AES-GCM associated data,
//! so a payload cannot be relabelled under another version or suite.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::encryption::{Nonce, TAG_SIZE};
use crate::error::{Error, Result};

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

/// Algorithm suite named in the envelope header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeAlgorithm {
    /// AES-256-GCM payload with an RSA-OAEP (SHA-256) wrapped key
    #[serde(rename = "RSA-OAEP-256+A256GCM")]
    RsaOaepAesGcm,
    /// AES-256-GCM payload under a pre-shared group key
    #[serde(rename = "A256GCM")]
    AesGcm,
}

impl EnvelopeAlgorithm {
    /// Name carried in the `alg` field
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeAlgorithm::RsaOaepAesGcm => "RSA-OAEP-256+A256GCM",
            EnvelopeAlgorithm::AesGcm => "A256GCM",
        }
    }

    /// Associated data for payloads sealed under this suite
    pub(crate) fn header_aad(&self) -> Vec<u8> {
        format!("chatsecure/v{}/{}", ENVELOPE_VERSION, self.as_str()).into_bytes()
    }
}

#[derive(Serialize, Deserialize)]
struct Wire {
    v: u8,
    alg: EnvelopeAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wk: Option<String>,
    iv: String,
    ct: String,
    tag: String,
}

/// Decoded envelope contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Algorithm suite
    pub algorithm: EnvelopeAlgorithm,
    /// Wrapped symmetric key (direct messages only)
    pub wrapped_key: Option<Vec<u8>>,
    /// AES-GCM nonce
    pub nonce: Nonce,
    /// Ciphertext without the tag
    pub ciphertext: Vec<u8>,
    /// Authentication tag
    pub tag: [u8; TAG_SIZE],
}

impl Envelope {
    /// Build an envelope from AES-GCM output, splitting off the trailing tag
    pub(crate) fn seal(
        algorithm: EnvelopeAlgorithm,
        wrapped_key: Option<Vec<u8>>,
        nonce: Nonce,
        mut sealed: Vec<u8>,
    ) -> Result<Self> {
        if sealed.len() < TAG_SIZE {
            return Err(Error::EncryptionFailed("Cipher output shorter than tag".into()));
        }
        let tag_bytes = sealed.split_off(sealed.len() - TAG_SIZE);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&tag_bytes);

        Ok(Self {
            algorithm,
            wrapped_key,
            nonce,
            ciphertext: sealed,
            tag,
        })
    }

    /// Ciphertext with the tag appended, as AES-GCM expects it
    pub(crate) fn sealed_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ciphertext.len() + TAG_SIZE);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Associated data the payload was sealed with
    pub(crate) fn header_aad(&self) -> Vec<u8> {
        self.algorithm.header_aad()
    }

    /// Serialize to envelope text
    pub fn encode(&self) -> Result<String> {
        let wire = Wire {
            v: ENVELOPE_VERSION,
            alg: self.algorithm,
            wk: self.wrapped_key.as_ref().map(|wk| BASE64.encode(wk)),
            iv: BASE64.encode(self.nonce.as_bytes()),
            ct: BASE64.encode(&self.ciphertext),
            tag: BASE64.encode(self.tag),
        };

        let json = serde_json::to_vec(&wire)?;
        Ok(BASE64.encode(json))
    }

    /// Parse envelope text, requiring the given algorithm suite
    pub fn decode(text: &str, expected: EnvelopeAlgorithm) -> Result<Self> {
        let json = BASE64.decode(text.trim())?;
        let wire: Wire = serde_json::from_slice(&json)
            .map_err(|e| Error::InvalidEnvelope(format!("Malformed envelope: {}", e)))?;

        if wire.v != ENVELOPE_VERSION {
            return Err(Error::InvalidEnvelope(format!(
                "Unsupported envelope version {}",
                wire.v
            )));
        }
        if wire.alg != expected {
            return Err(Error::InvalidEnvelope(format!(
                "Expected {:?} envelope, got {:?}",
                expected, wire.alg
            )));
        }

        let wrapped_key = match (expected, wire.wk) {
            (EnvelopeAlgorithm::RsaOaepAesGcm, Some(wk)) => Some(BASE64.decode(wk)?),
            (EnvelopeAlgorithm::RsaOaepAesGcm, None) => {
                return Err(Error::InvalidEnvelope("Missing wrapped key".into()))
            }
            (EnvelopeAlgorithm::AesGcm, Some(_)) => {
                return Err(Error::InvalidEnvelope(
                    "Group envelope must not carry a wrapped key".into(),
                ))
            }
            (EnvelopeAlgorithm::AesGcm, None) => None,
        };

        let nonce = Nonce::from_slice(&BASE64.decode(wire.iv)?)?;
        let ciphertext = BASE64.decode(wire.ct)?;
        let tag: [u8; TAG_SIZE] = BASE64
            .decode(wire.tag)?
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidEnvelope(format!("Tag must be {} bytes", TAG_SIZE)))?;

        Ok(Self {
            algorithm: expected,
            wrapped_key,
            nonce,
            ciphertext,
            tag,
        })
    }
}
