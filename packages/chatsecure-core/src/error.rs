//! # Error Handling
//!
//! Error types for ChatSecure Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Configuration Errors (fatal, abort initialization)                │
//! │  │   ├── MissingSecret         - Required secret absent or empty       │
//! │  │   └── InvalidConfig         - Unparseable configuration value       │
//! │  │                                                                      │
//! │  ├── Crypto Errors (caller input, usually attacker controlled)         │
//! │  │   ├── EncryptionFailed      - Encryption operation failed           │
//! │  │   ├── DecryptionFailed      - Decryption / authentication failed    │
//! │  │   ├── SigningFailed         - Signing operation failed              │
//! │  │   ├── InvalidKey            - Key could not be parsed               │
//! │  │   ├── InvalidKeyLength      - Symmetric key of the wrong size       │
//! │  │   ├── KeyGenerationFailed   - Entropy or library failure            │
//! │  │   ├── KeyDerivationFailed   - HKDF expansion failed                 │
//! │  │   ├── InvalidEnvelope       - Malformed ciphertext envelope         │
//! │  │   └── InvalidEncoding       - Text is not valid encoded bytes       │
//! │  │                                                                      │
//! │  ├── Token Errors                                                      │
//! │  │   ├── TokenEncodingFailed   - Could not sign a session token        │
//! │  │   ├── RevocationStore       - Revocation store reported a failure   │
//! │  │   └── RevocationTimeout     - Revocation store did not answer       │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      └── Serialization         - serde failure                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Caller-input errors never cross the fail-soft surfaces (`decrypt`,
//! `verify_*`, `TokenService::validate`): those convert them into a negative
//! result. They are only returned from the `try_*` variants and from
//! operations whose inputs come from the application itself.

use thiserror::Error;

/// Result type alias for ChatSecure Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ChatSecure Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors (100-199)
    // ========================================================================
    /// A required secret is missing or empty
    #[error("Required secret {0} is not configured")]
    MissingSecret(&'static str),

    /// A configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Invalid key format
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Symmetric key has the wrong length
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    /// Envelope could not be parsed
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Text could not be decoded to bytes
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    // ========================================================================
    // Token Errors (800-899)
    // ========================================================================
    /// Token could not be encoded and signed
    #[error("Failed to encode token: {0}")]
    TokenEncodingFailed(String),

    /// Revocation store failure
    #[error("Revocation store error: {0}")]
    RevocationStore(String),

    /// Revocation store call exceeded its deadline
    #[error("Revocation store timed out")]
    RevocationTimeout,

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Configuration
    /// - 300-399: Crypto
    /// - 800-899: Tokens
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Configuration (100-199)
            Error::MissingSecret(_) => 100,
            Error::InvalidConfig(_) => 101,

            // Crypto (300-399)
            Error::EncryptionFailed(_) => 300,
            Error::DecryptionFailed(_) => 301,
            Error::SigningFailed(_) => 302,
            Error::InvalidKey(_) => 304,
            Error::InvalidKeyLength { .. } => 305,
            Error::KeyGenerationFailed(_) => 306,
            Error::KeyDerivationFailed(_) => 307,
            Error::InvalidEnvelope(_) => 308,
            Error::InvalidEncoding(_) => 309,

            // Tokens (800-899)
            Error::TokenEncodingFailed(_) => 800,
            Error::RevocationStore(_) => 801,
            Error::RevocationTimeout => 802,

            // Internal (900-999)
            Error::Serialization(_) => 902,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Only dependency failures qualify; retrying is the caller's decision,
    /// the core itself never retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::RevocationStore(_) | Error::RevocationTimeout)
    }

    /// Check if this error must abort initialization
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MissingSecret(_) | Error::InvalidConfig(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::InvalidEncoding(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::MissingSecret("SECRET_KEY").code(), 100);
        assert_eq!(Error::EncryptionFailed("test".into()).code(), 300);
        assert_eq!(
            Error::InvalidKeyLength {
                expected: 32,
                actual: 16
            }
            .code(),
            305
        );
        assert_eq!(Error::RevocationTimeout.code(), 802);
        assert_eq!(Error::Serialization("test".into()).code(), 902);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::RevocationTimeout.is_recoverable());
        assert!(Error::RevocationStore("down".into()).is_recoverable());
        assert!(!Error::DecryptionFailed("tag".into()).is_recoverable());
        assert!(!Error::MissingSecret("SECRET_KEY").is_recoverable());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::MissingSecret("APP_SECRET").is_fatal());
        assert!(Error::InvalidConfig("bad ttl".into()).is_fatal());
        assert!(!Error::InvalidKey("pem".into()).is_fatal());
    }

    #[test]
    fn test_message_names_missing_secret() {
        let err = Error::MissingSecret("SECRET_KEY");
        assert!(err.to_string().contains("SECRET_KEY"));
    }
}
