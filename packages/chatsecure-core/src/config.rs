//! Core configuration.
//!
//! Secrets and token defaults are gathered into one [`CoreConfig`] at process
//! start and shared by `Arc` with the token service and the at-rest key
//! wrapper. A missing secret is fatal: the core refuses to start without one.

use std::env;
use std::fmt;
use std::time::Duration as StdDuration;

use chrono::Duration;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Default token issuer
pub const DEFAULT_ISSUER: &str = "chatsecure.example.com";

/// Default token audience
pub const DEFAULT_AUDIENCE: &str = "chatsecure-client";

/// Default scope stamped on access tokens
pub const DEFAULT_SCOPE: &str = "user";

/// Default access token lifetime in minutes
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Default refresh token lifetime in days
pub const REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;

/// Default deadline for a single revocation store call in milliseconds
pub const REVOCATION_TIMEOUT_MS: u64 = 2_000;

/// Environment variable names read by [`CoreConfig::from_env`]
pub mod vars {
    /// Token signing secret (required)
    pub const SECRET_KEY: &str = "SECRET_KEY";
    /// At-rest encryption secret for private keys (required)
    pub const APP_SECRET: &str = "APP_SECRET";
    /// Token issuer
    pub const JWT_ISSUER: &str = "JWT_ISSUER";
    /// Default token audience
    pub const JWT_AUDIENCE: &str = "JWT_AUDIENCE";
    /// Access token lifetime in minutes
    pub const ACCESS_TOKEN_EXPIRE_MINUTES: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
    /// Refresh token lifetime in days
    pub const REFRESH_TOKEN_EXPIRE_DAYS: &str = "REFRESH_TOKEN_EXPIRE_DAYS";
    /// Revocation store deadline in milliseconds
    pub const REVOCATION_TIMEOUT_MS: &str = "REVOCATION_TIMEOUT_MS";
}

/// Configuration for ChatSecure Core
#[derive(Clone)]
pub struct CoreConfig {
    token_secret: Zeroizing<Vec<u8>>,
    at_rest_secret: Zeroizing<Vec<u8>>,
    /// Issuer stamped on and required from tokens
    pub issuer: String,
    /// Audience used when the caller does not supply one
    pub default_audience: String,
    /// Scope stamped on access tokens when the caller does not supply one
    pub default_scope: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Deadline for each revocation store call
    pub revocation_timeout: StdDuration,
}

impl CoreConfig {
    /// Create a configuration with default token settings
    ///
    /// Both secrets are required; an empty secret is rejected.
    pub fn new(token_secret: impl AsRef<[u8]>, at_rest_secret: impl AsRef<[u8]>) -> Result<Self> {
        let token_secret = token_secret.as_ref();
        let at_rest_secret = at_rest_secret.as_ref();

        if token_secret.is_empty() {
            return Err(Error::MissingSecret(vars::SECRET_KEY));
        }
        if at_rest_secret.is_empty() {
            return Err(Error::MissingSecret(vars::APP_SECRET));
        }

        Ok(Self {
            token_secret: Zeroizing::new(token_secret.to_vec()),
            at_rest_secret: Zeroizing::new(at_rest_secret.to_vec()),
            issuer: DEFAULT_ISSUER.to_string(),
            default_audience: DEFAULT_AUDIENCE.to_string(),
            default_scope: DEFAULT_SCOPE.to_string(),
            access_token_ttl: Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES),
            refresh_token_ttl: Duration::days(REFRESH_TOKEN_EXPIRE_DAYS),
            revocation_timeout: StdDuration::from_millis(REVOCATION_TIMEOUT_MS),
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_secret =
            lookup(vars::SECRET_KEY).ok_or(Error::MissingSecret(vars::SECRET_KEY))?;
        let at_rest_secret =
            lookup(vars::APP_SECRET).ok_or(Error::MissingSecret(vars::APP_SECRET))?;

        let mut config = Self::new(token_secret.as_bytes(), at_rest_secret.as_bytes())?;

        if let Some(issuer) = lookup(vars::JWT_ISSUER) {
            config.issuer = issuer;
        }
        if let Some(audience) = lookup(vars::JWT_AUDIENCE) {
            config.default_audience = audience;
        }
        if let Some(minutes) = parse_var::<i64, _>(&lookup, vars::ACCESS_TOKEN_EXPIRE_MINUTES)? {
            config.access_token_ttl = Duration::try_minutes(minutes)
                .ok_or_else(|| out_of_range(vars::ACCESS_TOKEN_EXPIRE_MINUTES, minutes))?;
        }
        if let Some(days) = parse_var::<i64, _>(&lookup, vars::REFRESH_TOKEN_EXPIRE_DAYS)? {
            config.refresh_token_ttl = Duration::try_days(days)
                .ok_or_else(|| out_of_range(vars::REFRESH_TOKEN_EXPIRE_DAYS, days))?;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, vars::REVOCATION_TIMEOUT_MS)? {
            config.revocation_timeout = StdDuration::from_millis(ms);
        }

        Ok(config)
    }

    /// Secret used to sign session tokens
    pub(crate) fn token_secret(&self) -> &[u8] {
        &self.token_secret
    }

    /// Secret the at-rest key for private keys is derived from
    pub(crate) fn at_rest_secret(&self) -> &[u8] {
        &self.at_rest_secret
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{} is not a valid number: {:?}", name, raw))),
        None => Ok(None),
    }
}

fn out_of_range(name: &str, value: i64) -> Error {
    Error::InvalidConfig(format!("{} is out of range: {}", name, value))
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("token_secret", &"<redacted>")
            .field("at_rest_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("default_audience", &self.default_audience)
            .field("default_scope", &self.default_scope)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("revocation_timeout", &self.revocation_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoreConfig::new("token-secret", "app-secret").unwrap();

        assert_eq!(config.issuer, DEFAULT_ISSUER);
        assert_eq!(config.default_audience, DEFAULT_AUDIENCE);
        assert_eq!(config.access_token_ttl, Duration::minutes(30));
        assert_eq!(config.refresh_token_ttl, Duration::days(7));
        assert_eq!(config.token_secret(), b"token-secret");
        assert_eq!(config.at_rest_secret(), b"app-secret");
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let err = CoreConfig::new("", "app-secret").unwrap_err();
        assert!(matches!(err, Error::MissingSecret("SECRET_KEY")));
        assert!(err.is_fatal());

        let err = CoreConfig::new("token-secret", "").unwrap_err();
        assert!(matches!(err, Error::MissingSecret("APP_SECRET")));
    }

    #[test]
    fn test_missing_signing_secret_aborts() {
        let lookup = lookup_from(&[("APP_SECRET", "app-secret")]);
        let err = CoreConfig::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, Error::MissingSecret("SECRET_KEY")));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let lookup = lookup_from(&[
            ("SECRET_KEY", "token-secret"),
            ("APP_SECRET", "app-secret"),
            ("JWT_ISSUER", "issuer.test"),
            ("JWT_AUDIENCE", "aud.test"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("REFRESH_TOKEN_EXPIRE_DAYS", "1"),
            ("REVOCATION_TIMEOUT_MS", "250"),
        ]);
        let config = CoreConfig::from_lookup(lookup).unwrap();

        assert_eq!(config.issuer, "issuer.test");
        assert_eq!(config.default_audience, "aud.test");
        assert_eq!(config.access_token_ttl, Duration::minutes(5));
        assert_eq!(config.refresh_token_ttl, Duration::days(1));
        assert_eq!(config.revocation_timeout, StdDuration::from_millis(250));
    }

    #[test]
    fn test_bad_number_is_invalid_config() {
        let lookup = lookup_from(&[
            ("SECRET_KEY", "token-secret"),
            ("APP_SECRET", "app-secret"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "thirty"),
        ]);
        let err = CoreConfig::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_lifetime_is_invalid_config() {
        for (name, value) in [
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "9223372036854775807"),
            ("REFRESH_TOKEN_EXPIRE_DAYS", "-9223372036854775808"),
        ] {
            let lookup = lookup_from(&[
                ("SECRET_KEY", "token-secret"),
                ("APP_SECRET", "app-secret"),
                (name, value),
            ]);
            let err = CoreConfig::from_lookup(lookup).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains(name)));
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = CoreConfig::new("super-secret-token-key", "super-secret-app-key").unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("super-secret-token-key"));
        assert!(!debug.contains("super-secret-app-key"));
        assert!(debug.contains("<redacted>"));
    }
}
