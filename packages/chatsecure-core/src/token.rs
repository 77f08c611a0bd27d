//! # Session Tokens
//!
//! Issuance, validation and revocation of signed session tokens.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TOKEN LIFECYCLE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   issue ──► issued ──► valid ──┬──► expired   (exp passed)              │
//! │                                └──► revoked   (jti marked in store)     │
//! │                                                                         │
//! │   Terminal states never return to valid. Revocation is recorded in     │
//! │   the store; token bytes are never altered.                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Claims
//!
//! | Claim | Meaning |
//! |-------|---------|
//! | `sub` | Subject (caller supplied) |
//! | `iat`, `nbf` | Issue time (seconds since epoch) |
//! | `exp` | `iat + ttl` |
//! | `jti` | Random UUID, the revocation key |
//! | `type` | `access` or `refresh` |
//! | `aud`, `iss` | Audience and issuer |
//! | `scope` | Access tokens only |
//!
//! Tokens are HS256 JWTs signed with the configured token secret.
//!
//! ## Store Failures
//!
//! - Registration during `issue` fails open: the token is returned and a
//!   warning is logged.
//! - The revocation check during `validate` fails closed: the token is
//!   treated as invalid.
//! - A token without a `jti` skips the revocation check altogether. Such
//!   tokens cannot be revoked; this core never issues them.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::error::{Error, Result};

/// Claim map supplied by callers and returned from validation
pub type Claims = Map<String, Value>;

/// Kind of session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token presented on every request
    Access,
    /// Long-lived token exchanged for new access tokens
    Refresh,
}

impl TokenType {
    /// Claim value for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    fn from_claim(value: &str) -> Option<Self> {
        match value {
            "access" => Some(TokenType::Access),
            "refresh" => Some(TokenType::Refresh),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims of a token that passed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionClaims(Claims);

impl SessionClaims {
    /// Subject (`sub`)
    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    /// Scope (`scope`), present on access tokens
    pub fn scope(&self) -> Option<&str> {
        self.str_claim("scope")
    }

    /// Token identifier (`jti`)
    pub fn jti(&self) -> Option<&str> {
        self.str_claim("jti")
    }

    /// Audience (`aud`)
    pub fn audience(&self) -> Option<&str> {
        self.str_claim("aud")
    }

    /// Issuer (`iss`)
    pub fn issuer(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    /// Token type (`type`)
    pub fn token_type(&self) -> Option<TokenType> {
        self.str_claim("type").and_then(TokenType::from_claim)
    }

    /// Issue time (`iat`)
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.time_claim("iat")
    }

    /// Not-before time (`nbf`)
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.time_claim("nbf")
    }

    /// Expiry (`exp`)
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.time_claim("exp")
    }

    /// Any claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Borrow the full claim map
    pub fn as_map(&self) -> &Claims {
        &self.0
    }

    /// Take the full claim map
    pub fn into_map(self) -> Claims {
        self.0
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    fn time_claim(&self, name: &str) -> Option<DateTime<Utc>> {
        self.0
            .get(name)
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

// ============================================================================
// REVOCATION STORE
// ============================================================================

/// External jti store consulted for revocation
///
/// Each call must be atomic for a single jti. Calls are bounded by
/// [`CoreConfig::revocation_timeout`] using tokio's timer, so they must be
/// driven from within a Tokio runtime.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record a newly issued jti with its expiry
    async fn put(&self, jti: &str, expires_at: DateTime<Utc>, token_type: TokenType) -> Result<()>;

    /// Whether the jti has been revoked
    async fn is_revoked(&self, jti: &str) -> Result<bool>;

    /// Mark a jti revoked, recording it if it was never registered
    async fn revoke(&self, jti: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct JtiRecord {
    expires_at: Option<DateTime<Utc>>,
    token_type: Option<TokenType>,
    revoked: bool,
}

/// In-process revocation store
///
/// Suitable for tests and single-instance deployments.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    records: RwLock<HashMap<String, JtiRecord>>,
}

impl MemoryRevocationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked jtis
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no jti is tracked
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Type recorded for a jti at issuance
    pub fn token_type(&self, jti: &str) -> Option<TokenType> {
        self.records.read().get(jti).and_then(|r| r.token_type)
    }

    /// Drop records whose token has expired, returning how many were removed
    ///
    /// Records revoked without a known expiry are kept.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, r| r.expires_at.map_or(true, |exp| exp > now));
        before - records.len()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, jti: &str, expires_at: DateTime<Utc>, token_type: TokenType) -> Result<()> {
        let mut records = self.records.write();
        let record = records.entry(jti.to_string()).or_insert(JtiRecord {
            expires_at: None,
            token_type: None,
            revoked: false,
        });
        record.expires_at = Some(expires_at);
        record.token_type = Some(token_type);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        Ok(self.records.read().get(jti).map_or(false, |r| r.revoked))
    }

    async fn revoke(&self, jti: &str) -> Result<()> {
        self.records
            .write()
            .entry(jti.to_string())
            .or_insert(JtiRecord {
                expires_at: None,
                token_type: None,
                revoked: false,
            })
            .revoked = true;
        Ok(())
    }
}

// ============================================================================
// TOKEN SERVICE
// ============================================================================

/// Issues and validates session tokens
///
/// Every async method consults the revocation store under a tokio timeout
/// and therefore panics if polled outside a Tokio runtime with the time
/// driver enabled.
pub struct TokenService {
    config: Arc<CoreConfig>,
    store: Arc<dyn RevocationStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a token service signing with the configured token secret
    pub fn new(config: Arc<CoreConfig>, store: Arc<dyn RevocationStore>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.token_secret());
        let decoding_key = DecodingKey::from_secret(config.token_secret());

        Self {
            config,
            store,
            encoding_key,
            decoding_key,
        }
    }

    /// The configuration this service was built with
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Issue a token carrying a copy of `claims` plus the standard claims
    ///
    /// `claims` is never modified. `audience` falls back to the configured
    /// default. If the jti cannot be registered the token is still returned.
    /// A `ttl` that puts the expiry beyond the representable date range is
    /// rejected with [`Error::TokenEncodingFailed`].
    pub async fn issue(
        &self,
        claims: &Claims,
        ttl: Duration,
        token_type: TokenType,
        audience: Option<&str>,
    ) -> Result<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            Error::TokenEncodingFailed(format!("Token lifetime out of range: {}", ttl))
        })?;
        let jti = Uuid::new_v4().to_string();
        let audience = audience.unwrap_or(&self.config.default_audience);

        let mut payload = claims.clone();
        payload.insert("exp".into(), expires_at.timestamp().into());
        payload.insert("iat".into(), now.timestamp().into());
        payload.insert("nbf".into(), now.timestamp().into());
        payload.insert("jti".into(), jti.clone().into());
        payload.insert("type".into(), token_type.as_str().into());
        payload.insert("aud".into(), audience.into());
        payload.insert("iss".into(), self.config.issuer.clone().into());

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| Error::TokenEncodingFailed(e.to_string()))?;

        if let Err(e) = self
            .bounded(self.store.put(&jti, expires_at, token_type))
            .await
        {
            tracing::warn!(jti = %jti, error = %e, "Could not register token id, issuing anyway");
        }

        tracing::debug!(jti = %jti, %token_type, "Issued token");
        Ok(token)
    }

    /// Issue an access token with the configured lifetime
    ///
    /// `scope` falls back to the configured default scope.
    pub async fn issue_access(
        &self,
        claims: &Claims,
        scope: Option<&str>,
        audience: Option<&str>,
    ) -> Result<String> {
        let mut payload = claims.clone();
        payload.insert(
            "scope".into(),
            scope.unwrap_or(&self.config.default_scope).into(),
        );

        self.issue(&payload, self.config.access_token_ttl, TokenType::Access, audience)
            .await
    }

    /// Issue a refresh token with the configured lifetime
    pub async fn issue_refresh(&self, claims: &Claims, audience: Option<&str>) -> Result<String> {
        self.issue(claims, self.config.refresh_token_ttl, TokenType::Refresh, audience)
            .await
    }

    /// Validate a token
    ///
    /// Returns `None` when the signature is invalid, the token is expired or
    /// not yet valid, the audience does not match (`None` means the configured
    /// default audience; a token without `aud` never matches), the issuer
    /// does not match (skipped when `None`), the type differs from
    /// `expected`, or the jti is revoked. A failing or slow revocation store
    /// also yields `None`.
    pub async fn validate(
        &self,
        token: &str,
        expected: TokenType,
        audience: Option<&str>,
        issuer: Option<&str>,
        check_revocation: bool,
    ) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "aud"]);
        validation.set_audience(&[audience.unwrap_or(&self.config.default_audience)]);

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => SessionClaims(data.claims),
            Err(e) => {
                tracing::info!(reason = ?e.kind(), "Token rejected");
                return None;
            }
        };

        if let Some(required) = issuer {
            if claims.issuer() != Some(required) {
                tracing::warn!(issuer = ?claims.issuer(), "Token with unexpected issuer");
                return None;
            }
        }

        if claims.token_type() != Some(expected) {
            tracing::warn!(token_type = ?claims.get("type"), %expected, "Token with unexpected type");
            return None;
        }

        if check_revocation {
            if let Some(jti) = claims.jti() {
                match self.bounded(self.store.is_revoked(jti)).await {
                    Ok(false) => {}
                    Ok(true) => {
                        tracing::info!(jti = %jti, "Token revoked");
                        return None;
                    }
                    Err(e) => {
                        tracing::error!(jti = %jti, error = %e, "Revocation check failed, denying token");
                        return None;
                    }
                }
            }
        }

        Some(claims)
    }

    /// Validate with the configured audience and issuer and a revocation check
    pub async fn validate_default(&self, token: &str, expected: TokenType) -> Option<SessionClaims> {
        self.validate(
            token,
            expected,
            Some(self.config.default_audience.as_str()),
            Some(self.config.issuer.as_str()),
            true,
        )
        .await
    }

    /// Subject of a valid access token
    pub async fn get_subject(&self, token: &str) -> Option<String> {
        self.validate_default(token, TokenType::Access)
            .await
            .and_then(|claims| claims.subject().map(str::to_owned))
    }

    /// Revoke a token by its jti
    ///
    /// The signature must be valid; expiry, audience and type are not
    /// checked. Returns `Ok(false)` for a forged token or one without a jti.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => SessionClaims(data.claims),
            Err(e) => {
                tracing::info!(reason = ?e.kind(), "Refusing to revoke unverifiable token");
                return Ok(false);
            }
        };

        let Some(jti) = claims.jti() else {
            return Ok(false);
        };

        self.bounded(self.store.revoke(jti)).await?;
        tracing::info!(jti = %jti, "Token revoked");
        Ok(true)
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.revocation_timeout, call)
            .await
            .map_err(|_| Error::RevocationTimeout)?
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.config.issuer)
            .field("default_audience", &self.config.default_audience)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
