//! Verifier configuration
//!
//! Everything the verifier needs is fixed at construction: which key set to
//! trust, which audience to accept and which algorithm to require.
//!
//! ```
//! use jwkverify::{Algorithm, VerifierConfig};
//! use std::time::Duration;
//!
//! let config = VerifierConfig::new("https://api.warpcast.com/v2/jwks", "https://app.example/")
//!     .algorithm(Algorithm::RS256)
//!     .issuer("https://auth.farcaster.xyz")
//!     .cache_ttl(Duration::from_secs(600));
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::url::validate_jwks_uri;
use std::time::Duration;

/// Default lifetime of a cached key set snapshot
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default bound on a single key set fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default minimum snapshot age before a `kid` miss may refetch
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// How strictly tokens are verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationMode {
    /// Decode, check policy, resolve the key and verify the signature
    #[default]
    Strict,

    /// Decode and check policy only. Signatures are NOT verified.
    ///
    /// For tests against tokens without a reachable key set. Every
    /// verification in this mode logs a warning.
    #[cfg(feature = "insecure-skip-signature")]
    InsecureSkipSignature,
}

/// Static configuration for a [`TokenVerifier`](crate::TokenVerifier) and
/// its [`KeySetCache`](crate::KeySetCache)
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub(crate) jwks_url: String,
    pub(crate) audience: String,
    pub(crate) algorithm: Algorithm,
    pub(crate) issuer: Option<String>,
    pub(crate) cache_ttl: Duration,
    pub(crate) fetch_timeout: Duration,
    pub(crate) min_refresh_interval: Duration,
    pub(crate) mode: VerificationMode,
}

impl VerifierConfig {
    /// Configuration with secure defaults: RS256, no issuer check, strict mode
    pub fn new(jwks_url: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            audience: audience.into(),
            algorithm: Algorithm::RS256,
            issuer: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            mode: VerificationMode::Strict,
        }
    }

    /// Require this signing algorithm
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Require the `iss` claim to equal `issuer`
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set how long a fetched key set is served from cache
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the bound on a single key set fetch
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the minimum snapshot age before an unknown `kid` triggers a refetch.
    ///
    /// `Duration::ZERO` refetches on every miss.
    pub fn min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Set the verification mode
    pub fn mode(mut self, mode: VerificationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Key set URL
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Expected audience
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Expected issuer, when enforced
    pub fn expected_issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Required algorithm
    pub fn expected_algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Check the configuration is usable.
    ///
    /// Fails with [`Error::ConfigurationInvalid`].
    pub fn validate(&self) -> Result<()> {
        validate_jwks_uri(&self.jwks_url)?;

        if self.audience.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "audience cannot be empty".into(),
            ));
        }

        if self.issuer.as_deref().is_some_and(str::is_empty) {
            return Err(Error::ConfigurationInvalid("issuer cannot be empty".into()));
        }

        if self.fetch_timeout.is_zero() {
            return Err(Error::ConfigurationInvalid(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        if self.cache_ttl.is_zero() {
            return Err(Error::ConfigurationInvalid(
                "cache TTL must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
