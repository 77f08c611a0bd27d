//! # ChatSecure Core
//!
//! The cryptographic trust layer of the ChatSecure end-to-end encrypted chat
//! backend. HTTP routing, persistence and rate limiting live elsewhere and
//! call into this crate with plain strings and byte buffers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CHATSECURE CORE MODULES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │    Keys     │  │   Hybrid    │  │    Group    │  │   Signing    │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - RSA/ECC   │  │ - RSA-OAEP  │  │ - AES-GCM   │  │ - PKCS#1 v15 │   │
//! │  │ - At-rest   │  │ - AES-GCM   │  │ - 256-bit   │  │ - ECDSA P256 │   │
//! │  │   wrapping  │  │ - Fail-soft │  │ - Fail-soft │  │ - Never panic│   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴───────┬────────┴────────────────┘           │
//! │                                  │                                      │
//! │  ┌─────────────┐  ┌──────────────▼──┐  ┌──────────────────────────────┐│
//! │  │  Integrity  │  │    Messaging    │  │           Tokens             ││
//! │  │             │◄─┤                 │  │                              ││
//! │  │ - SHA-256   │  │ - SealedMessage │  │ - HS256 JWT                  ││
//! │  │ - Batch     │  │                 │  │ - jti revocation store       ││
//! │  └─────────────┘  └─────────────────┘  └──────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Secrets and token defaults
//! - [`encoding`] - Canonical bytes ↔ text conversion
//! - [`crypto`] - Keys, ciphers and signatures
//! - [`integrity`] - Message hash binding and batch verification
//! - [`token`] - Session token issuance, validation and revocation
//! - [`messaging`] - Sealed message composition
//!
//! ## Failure Behavior
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Missing secret at startup | `Err`, initialization aborts |
//! | Tampered or foreign envelope | `decrypt` returns the envelope text |
//! | Malformed signature or key | `verify_*` returns `false` |
//! | Bad, expired or revoked token | `validate` returns `None` |
//! | Revocation store down during `validate` | `None` (fail closed) |
//! | Revocation store down during `issue` | Token issued, warning logged |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod integrity;
pub mod messaging;
pub mod token;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::CoreConfig;
pub use crypto::{GroupKey, KeyAlgorithm, Keypair, PrivateKeyInput, UserKeyBundle};
pub use error::{Error, Result};
pub use integrity::{MessageBinding, StoredMessage, VerificationReport};
pub use messaging::SealedMessage;
pub use token::{
    Claims, MemoryRevocationStore, RevocationStore, SessionClaims, TokenService, TokenType,
};

// ============================================================================
// CORE INSTANCE
// ============================================================================

use std::sync::Arc;

use zeroize::Zeroizing;

use crypto::{AtRestCipher, KeyWrapper};

/// Configured services shared by the request handlers of one process
///
/// Built once at startup from a [`CoreConfig`] and passed by reference;
/// there is no process-wide global.
pub struct SecurityCore {
    config: Arc<CoreConfig>,
    tokens: TokenService,
    key_wrapper: Arc<dyn KeyWrapper>,
}

impl SecurityCore {
    /// Build the core from a configuration and a revocation store
    pub fn new(config: CoreConfig, store: Arc<dyn RevocationStore>) -> Result<Self> {
        let key_wrapper = Arc::new(AtRestCipher::from_config(&config)?);
        Ok(Self::with_key_wrapper(config, store, key_wrapper))
    }

    /// Build the core with an alternative private key wrapper
    pub fn with_key_wrapper(
        config: CoreConfig,
        store: Arc<dyn RevocationStore>,
        key_wrapper: Arc<dyn KeyWrapper>,
    ) -> Self {
        tracing::info!("Initializing ChatSecure Core v{}", version());

        let config = Arc::new(config);
        let tokens = TokenService::new(config.clone(), store);

        tracing::info!(issuer = %config.issuer, "ChatSecure Core initialized");
        Self {
            config,
            tokens,
            key_wrapper,
        }
    }

    /// Build the core from environment variables
    ///
    /// Fails if `SECRET_KEY` or `APP_SECRET` is missing.
    pub fn from_env(store: Arc<dyn RevocationStore>) -> Result<Self> {
        Self::new(CoreConfig::from_env()?, store)
    }

    /// Shared configuration
    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.config
    }

    /// Session token service
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Private key wrapper
    pub fn key_wrapper(&self) -> &dyn KeyWrapper {
        self.key_wrapper.as_ref()
    }

    /// Generate and wrap the keypairs for a new user
    pub fn provision_user_keys(&self) -> Result<UserKeyBundle> {
        crypto::provision_user_keys(self.key_wrapper())
    }

    /// Unwrap a stored private key for immediate use
    pub fn unwrap_private_key(&self, wrapped: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.key_wrapper.unwrap(wrapped)
    }
}

impl std::fmt::Debug for SecurityCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityCore")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of ChatSecure Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> SecurityCore {
        let config = CoreConfig::new("token-secret", "app-secret").unwrap();
        SecurityCore::new(config, Arc::new(MemoryRevocationStore::new())).unwrap()
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_missing_secrets_abort_initialization() {
        let result = CoreConfig::from_lookup(|_| None)
            .and_then(|config| SecurityCore::new(config, Arc::new(MemoryRevocationStore::new())));

        assert!(matches!(result, Err(ref e) if e.is_fatal()));
    }

    #[test]
    fn test_provision_and_unwrap() {
        let core = core();
        let bundle = core.provision_user_keys().unwrap();

        let pem = core.unwrap_private_key(&bundle.ecc_private_key_wrapped).unwrap();
        assert!(std::str::from_utf8(&pem).unwrap().contains("PRIVATE KEY"));
    }

    #[tokio::test]
    async fn test_token_round_trip_through_core() {
        let core = core();
        let mut claims = Claims::new();
        claims.insert("sub".into(), "alice".into());

        let token = core.tokens().issue_access(&claims, None, None).await.unwrap();
        assert_eq!(core.tokens().get_subject(&token).await.as_deref(), Some("alice"));
    }
}
