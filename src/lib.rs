//! # jwkverify - JWT verification against a cached JWK set
//!
//! **jwkverify** checks compact signed tokens (JWTs) issued by a third-party
//! identity provider. A token is accepted only when it was signed by a key the
//! provider currently publishes and its claims are meant for this application.
//!
//! ## Overview
//!
//! The provider publishes its public keys as a JSON Web Key Set at a fixed
//! URL. Verifying a token means decoding its three Base64URL segments,
//! checking the header algorithm and the `aud`/`exp`/`iss` claims, selecting
//! the key named by the header `kid`, and checking the RSA signature over the
//! exact `header.payload` bytes received.
//!
//! The key set is held in a [`KeySetCache`]: fetched on first use, served from
//! memory until its TTL expires and refetched at most once when a token names
//! a `kid` the cached set does not contain (key rotation). Concurrent
//! verifications share a single in-flight fetch.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jwkverify::{KeySetCache, TokenVerifier, VerifierConfig};
//! use std::sync::Arc;
//!
//! let config = VerifierConfig::new(
//!     "https://api.warpcast.com/v2/jwks",
//!     "https://app.example/",
//! );
//!
//! // Once at startup; share the cache between every verifier
//! let cache = Arc::new(KeySetCache::new(&config)?);
//! let verifier = TokenVerifier::new(config, cache)?;
//!
//! let token = verifier.verify(token_str).await?;
//! println!("Subject: {:?}", token.subject());
//! ```
//!
//! ## Verification Flow
//!
//! ```text
//! token string
//!     │ decode            MalformedToken
//!     ▼
//! header + payload + signature
//!     │ alg, aud, exp,    UnsupportedAlgorithm, AudienceMismatch,
//!     │ iss (optional)    TokenExpired, IssuerMismatch
//!     ▼
//! kid lookup              UnknownSigningKey, KeySetFetch
//!     │
//!     ▼
//! RSA signature check     InvalidKeyMaterial, SignatureInvalid
//!     │
//!     ▼
//! VerifiedToken
//! ```
//!
//! Claim checks run before the key lookup: a token with the wrong audience or
//! an expired `exp` is rejected without touching the network.
//!
//! ## Algorithm Support
//!
//! RS256 (default), RS384 and RS512. The algorithm is fixed by
//! configuration; the header's `alg` must match it exactly, so a token cannot
//! select a different verification path (such as HMAC or `none`).
//!
//! ## Errors
//!
//! [`Error::is_retryable`] separates key set infrastructure failures
//! ([`Error::KeySetFetch`]), which say nothing about the token, from token
//! rejections. [`Error::kind`] gives a stable code for logs and responses.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: cache hits and misses and pipeline
//! stages at `debug`, key set fetches at `info`, fetch failures and
//! ambiguous key sets at `warn`. Tokens are never logged.
//!
//! ## Feature Flags
//!
//! - `insecure-skip-signature`: adds [`VerificationMode::InsecureSkipSignature`],
//!   which checks claims but not signatures. For tests only.

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod config;
pub(crate) mod token;
pub(crate) mod url;
pub(crate) mod utils;
pub(crate) mod validator;

#[cfg(test)]
pub(crate) mod test_helper;

// Public Interface
pub use algorithm::Algorithm;
pub use config::{
    DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_MIN_REFRESH_INTERVAL, VerificationMode,
    VerifierConfig,
};
pub use error::{Error, ErrorKind, FetchError, Malformed, Result, Segment};
pub use jwks::{HttpKeySetSource, KeySet, KeySetCache, KeySetFuture, KeySetSource};
pub use validator::{TokenVerifier, VerifiedToken};

pub(crate) mod limits;
