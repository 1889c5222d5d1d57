//! Token verification
//!
//! [`TokenVerifier`] runs the full pipeline for one token:
//!
//! 1. Decode the three segments
//! 2. Check `alg`, `aud`, `exp` and (optionally) `iss`
//! 3. Resolve the signing key by `kid` through the shared [`KeySetCache`]
//! 4. Verify the signature over the original `header.payload` bytes
//!
//! Any failure ends the pipeline with the matching [`Error`]. Policy checks
//! run before the key lookup, so a rejected token never causes network or
//! cryptographic work.

use crate::algorithm::{Algorithm, verify_with_jwk};
use crate::claims::{self, numeric_member};
use crate::config::{VerificationMode, VerifierConfig};
use crate::error::{Error, Result};
use crate::jwks::KeySetCache;
use crate::limits::MAX_KID_LENGTH;
use crate::token::{DecodedToken, string_member};
use miniserde::json::{Object, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Verifies tokens against one provider's key set.
///
/// Cheap to clone; clones share the key set cache.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config: VerifierConfig,
    cache: Arc<KeySetCache>,
}

impl TokenVerifier {
    /// Create a verifier using `cache` for key lookups.
    ///
    /// The cache must have been built for the same key set URL as `config`.
    pub fn new(config: VerifierConfig, cache: Arc<KeySetCache>) -> Result<Self> {
        config.validate()?;

        if cache.source_url() != config.jwks_url {
            return Err(Error::ConfigurationInvalid(format!(
                "cache serves {}, configuration expects {}",
                cache.source_url(),
                config.jwks_url
            )));
        }

        #[cfg(feature = "insecure-skip-signature")]
        if config.mode == VerificationMode::InsecureSkipSignature {
            tracing::warn!("token verifier created with signature verification DISABLED");
        }

        Ok(Self { config, cache })
    }

    /// Configuration this verifier enforces
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Key set cache this verifier resolves keys through
    pub fn cache(&self) -> &Arc<KeySetCache> {
        &self.cache
    }

    /// Verify `token` against the system clock
    pub async fn verify(&self, token: &str) -> Result<VerifiedToken> {
        self.verify_at(token, unix_now()).await
    }

    /// Verify `token` as of Unix time `now` (seconds)
    #[tracing::instrument(skip_all, fields(now = now))]
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedToken> {
        let decoded = DecodedToken::decode(token)?;
        tracing::debug!(stage = "decoded");

        claims::check_policy(&decoded, &self.config, now)?;
        tracing::debug!(stage = "policy_checked");

        match self.config.mode {
            VerificationMode::Strict => {}
            #[cfg(feature = "insecure-skip-signature")]
            VerificationMode::InsecureSkipSignature => {
                tracing::warn!("signature NOT verified (insecure-skip-signature mode)");
                return Ok(VerifiedToken::new(decoded, self.config.algorithm));
            }
        }

        let kid = match decoded.key_id() {
            Some(kid) if kid.len() <= MAX_KID_LENGTH => kid,
            kid => {
                return Err(Error::UnknownSigningKey {
                    kid: kid.map(String::from),
                });
            }
        };

        let jwk = self
            .cache
            .get_key(kid)
            .await?
            .ok_or_else(|| Error::UnknownSigningKey {
                kid: Some(kid.into()),
            })?;
        tracing::debug!(stage = "key_resolved", kid);

        let valid = verify_with_jwk(
            self.config.algorithm,
            decoded.signing_input().as_bytes(),
            decoded.signature(),
            &jwk,
        )?;
        if !valid {
            return Err(Error::SignatureInvalid);
        }
        tracing::debug!(stage = "signature_checked");

        Ok(VerifiedToken::new(decoded, self.config.algorithm))
    }
}

/// A token that passed every check
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    header: Object,
    payload: Object,
    algorithm: Algorithm,
}

impl VerifiedToken {
    fn new(decoded: DecodedToken<'_>, algorithm: Algorithm) -> Self {
        let (header, payload) = decoded.into_parts();
        Self {
            header,
            payload,
            algorithm,
        }
    }

    /// Decoded header
    pub fn header(&self) -> &Object {
        &self.header
    }

    /// Decoded payload (claims)
    pub fn payload(&self) -> &Object {
        &self.payload
    }

    /// Algorithm the signature was verified with
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Header `kid`
    pub fn key_id(&self) -> Option<&str> {
        string_member(&self.header, "kid")
    }

    /// `aud` claim
    pub fn audience(&self) -> Option<&str> {
        string_member(&self.payload, "aud")
    }

    /// `exp` claim, seconds since the Unix epoch
    pub fn expiration(&self) -> Option<i64> {
        numeric_member(&self.payload, "exp")
    }

    /// `iss` claim
    pub fn issuer(&self) -> Option<&str> {
        string_member(&self.payload, "iss")
    }

    /// `sub` claim
    pub fn subject(&self) -> Option<&str> {
        string_member(&self.payload, "sub")
    }

    /// Any payload claim by name
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Take the decoded header and payload
    pub fn into_parts(self) -> (Object, Object) {
        (self.header, self.payload)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, Malformed};
    use crate::jwks::{KeySetFuture, KeySetSource};
    use crate::test_helper::TestKey;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const URL: &str = "https://provider.example/v2/jwks";
    const AUD: &str = "https://app.example/";
    const NOW: i64 = 1_700_000_000;

    /// Serves one fixed response and counts fetches
    struct FixedSource {
        body: std::result::Result<String, FetchError>,
        calls: AtomicUsize,
    }

    impl KeySetSource for FixedSource {
        fn fetch<'a>(&'a self, _url: &'a str) -> KeySetFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.body.clone().map(String::into_bytes)
            })
        }
    }

    fn setup(
        config: VerifierConfig,
        body: std::result::Result<String, FetchError>,
    ) -> (TokenVerifier, Arc<FixedSource>) {
        let source = Arc::new(FixedSource {
            body,
            calls: AtomicUsize::new(0),
        });
        let cache = KeySetCache::with_source(&config, source.clone()).expect("cache");
        let verifier = TokenVerifier::new(config, Arc::new(cache)).expect("verifier");
        (verifier, source)
    }

    fn config() -> VerifierConfig {
        VerifierConfig::new(URL, AUD).min_refresh_interval(Duration::ZERO)
    }

    fn key_set() -> std::result::Result<String, FetchError> {
        Ok(TestKey::shared().key_set(&["k1"]))
    }

    fn claims(exp: i64) -> String {
        format!(r#"{{"aud":"{AUD}","exp":{exp},"sub":"fid:42","iss":"https://issuer.example"}}"#)
    }

    fn token(header: &str, payload: &str) -> String {
        TestKey::shared().token(header, payload)
    }

    #[tokio::test]
    async fn test_valid_token() {
        let (verifier, source) = setup(config(), key_set());
        let raw = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW + 60));

        let verified = verifier.verify_at(&raw, NOW).await.expect("valid token");
        assert_eq!(verified.algorithm(), Algorithm::RS256);
        assert_eq!(verified.key_id(), Some("k1"));
        assert_eq!(verified.audience(), Some(AUD));
        assert_eq!(verified.expiration(), Some(NOW + 60));
        assert_eq!(verified.subject(), Some("fid:42"));
        assert_eq!(verified.issuer(), Some("https://issuer.example"));
        assert!(matches!(verified.claim("sub"), Some(Value::String(s)) if s == "fid:42"));
        assert!(verified.claim("nbf").is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tampered_payload() {
        let (verifier, _) = setup(config(), key_set());
        let raw = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW + 60));
        let forged = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW + 3600));

        // Original signature on a different payload
        let mut parts: Vec<&str> = forged.split('.').collect();
        parts[2] = raw.rsplit('.').next().unwrap();
        let spliced = parts.join(".");

        assert_eq!(
            verifier.verify_at(&spliced, NOW).await.unwrap_err(),
            Error::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_policy_failures_skip_network() {
        let (verifier, source) = setup(config(), key_set());

        let cases = [
            token(r#"{"alg":"HS256","kid":"k1"}"#, &claims(NOW + 60)),
            token(
                r#"{"alg":"RS256","kid":"k1"}"#,
                &format!(r#"{{"aud":"https://app.example","exp":{}}}"#, NOW + 60),
            ),
            token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW)),
            "not-a-token".to_string(),
        ];
        for raw in &cases {
            assert!(verifier.verify_at(raw, NOW).await.is_err());
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_token() {
        let (verifier, _) = setup(config(), key_set());
        assert_eq!(
            verifier.verify_at("a.b", NOW).await.unwrap_err(),
            Error::MalformedToken(Malformed::SegmentCount { found: 2 })
        );
    }

    #[tokio::test]
    async fn test_missing_kid_skips_network() {
        let (verifier, source) = setup(config(), key_set());
        let raw = token(r#"{"alg":"RS256"}"#, &claims(NOW + 60));

        assert_eq!(
            verifier.verify_at(&raw, NOW).await.unwrap_err(),
            Error::UnknownSigningKey { kid: None }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_kid() {
        let (verifier, source) = setup(config(), key_set());
        let raw = token(r#"{"alg":"RS256","kid":"k9"}"#, &claims(NOW + 60));

        assert_eq!(
            verifier.verify_at(&raw, NOW).await.unwrap_err(),
            Error::UnknownSigningKey {
                kid: Some("k9".into())
            }
        );
        // Cold fetch plus one forced refresh
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_retryable() {
        let (verifier, _) = setup(config(), Err(FetchError::Status(502)));
        let raw = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW + 60));

        let err = verifier.verify_at(&raw, NOW).await.unwrap_err();
        assert_eq!(err, Error::KeySetFetch(FetchError::Status(502)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_issuer_enforced() {
        let (verifier, _) = setup(config().issuer("https://other.example"), key_set());
        let raw = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW + 60));

        assert!(matches!(
            verifier.verify_at(&raw, NOW).await,
            Err(Error::IssuerMismatch { found: Some(ref f), .. }) if f == "https://issuer.example"
        ));
    }

    #[tokio::test]
    async fn test_verify_uses_system_clock() {
        let (verifier, _) = setup(config(), key_set());
        let raw = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW));

        // NOW is in the past
        assert!(matches!(
            verifier.verify(&raw).await,
            Err(Error::TokenExpired { exp: Some(NOW), .. })
        ));
    }

    #[test]
    fn test_cache_url_must_match_config() {
        let source = Arc::new(FixedSource {
            body: key_set(),
            calls: AtomicUsize::new(0),
        });
        let cache = KeySetCache::with_source(&config(), source).expect("cache");
        let other = VerifierConfig::new("https://elsewhere.example/jwks", AUD);

        assert!(matches!(
            TokenVerifier::new(other, Arc::new(cache)),
            Err(Error::ConfigurationInvalid(_))
        ));
    }

    #[cfg(feature = "insecure-skip-signature")]
    #[tokio::test]
    async fn test_insecure_mode_still_checks_policy() {
        let (verifier, source) = setup(
            config().mode(VerificationMode::InsecureSkipSignature),
            key_set(),
        );

        let unsigned = format!(
            "{}.{}.AAAA",
            crate::utils::base64url::encode(r#"{"alg":"RS256","kid":"none"}"#),
            crate::utils::base64url::encode(claims(NOW + 60)),
        );
        assert!(verifier.verify_at(&unsigned, NOW).await.is_ok());

        let expired = token(r#"{"alg":"RS256","kid":"k1"}"#, &claims(NOW));
        assert!(matches!(
            verifier.verify_at(&expired, NOW).await,
            Err(Error::TokenExpired { .. })
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
