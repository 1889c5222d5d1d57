//! Errors for jwkverify
//!
//! Every failure of the verification pipeline is one variant of [`Error`].
//! Token faults (the token must be rejected) are kept apart from key-set
//! infrastructure faults (the caller may retry) via [`Error::is_retryable`].

use thiserror::Error;

/// Verification errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Token Errors
    // ============================================================================
    #[error("Malformed token: {0}")]
    MalformedToken(Malformed),

    #[error("Unsupported algorithm: {}", display_opt(.found))]
    UnsupportedAlgorithm { found: Option<String> },

    #[error("Token audience mismatch: expected '{expected}', found {}", display_opt(.found))]
    AudienceMismatch {
        found: Option<String>,
        expected: String,
    },

    #[error("Token expired: exp {} (now: {now})", display_opt(.exp))]
    TokenExpired { exp: Option<i64>, now: i64 },

    #[error("Token issuer mismatch: expected '{expected}', found {}", display_opt(.found))]
    IssuerMismatch {
        found: Option<String>,
        expected: String,
    },

    #[error("Unknown signing key: {}", display_opt(.kid))]
    UnknownSigningKey { kid: Option<String> },

    #[error("Signature verification failed")]
    SignatureInvalid,

    // ============================================================================
    // Key Set Errors
    // ============================================================================
    #[error("Key set fetch failed: {0}")]
    KeySetFetch(FetchError),

    #[error("Invalid key material for '{kid}': {reason}")]
    InvalidKeyMaterial { kid: String, reason: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

/// Why a token could not be decoded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Malformed {
    #[error("expected 3 segments separated by '.', found {found}")]
    SegmentCount { found: usize },

    #[error("{segment} segment is empty")]
    EmptySegment { segment: Segment },

    #[error("{segment} segment is not valid base64url: {reason}")]
    Base64 { segment: Segment, reason: String },

    #[error("{segment} segment is not valid UTF-8")]
    Utf8 { segment: Segment },

    #[error("{segment} segment is not a JSON object")]
    Json { segment: Segment },

    #[error("{what} too large: {size} bytes (maximum: {max} bytes)")]
    TooLarge {
        what: &'static str,
        size: usize,
        max: usize,
    },
}

/// Token segment named in decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Payload,
    Signature,
}

impl Segment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Segment::Header => "header",
            Segment::Payload => "payload",
            Segment::Signature => "signature",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the key set could not be obtained
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network: {0}")]
    Network(String),

    #[error("http: status {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("response too large: {size} bytes (maximum: {max} bytes)")]
    ResponseTooLarge { size: usize, max: usize },

    #[error("invalid key set document: {0}")]
    InvalidDocument(String),
}

/// Stable, payload-free classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedToken,
    UnsupportedAlgorithm,
    AudienceMismatch,
    TokenExpired,
    IssuerMismatch,
    UnknownSigningKey,
    KeySetFetch,
    InvalidKeyMaterial,
    SignatureInvalid,
    ConfigurationInvalid,
}

impl ErrorKind {
    /// Snake-case code suitable for logs and response bodies
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedToken => "malformed_token",
            ErrorKind::UnsupportedAlgorithm => "unsupported_algorithm",
            ErrorKind::AudienceMismatch => "audience_mismatch",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::IssuerMismatch => "issuer_mismatch",
            ErrorKind::UnknownSigningKey => "unknown_signing_key",
            ErrorKind::KeySetFetch => "key_set_fetch_error",
            ErrorKind::InvalidKeyMaterial => "invalid_key_material",
            ErrorKind::SignatureInvalid => "signature_invalid",
            ErrorKind::ConfigurationInvalid => "configuration_invalid",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedToken(_) => ErrorKind::MalformedToken,
            Error::UnsupportedAlgorithm { .. } => ErrorKind::UnsupportedAlgorithm,
            Error::AudienceMismatch { .. } => ErrorKind::AudienceMismatch,
            Error::TokenExpired { .. } => ErrorKind::TokenExpired,
            Error::IssuerMismatch { .. } => ErrorKind::IssuerMismatch,
            Error::UnknownSigningKey { .. } => ErrorKind::UnknownSigningKey,
            Error::SignatureInvalid => ErrorKind::SignatureInvalid,
            Error::KeySetFetch(_) => ErrorKind::KeySetFetch,
            Error::InvalidKeyMaterial { .. } => ErrorKind::InvalidKeyMaterial,
            Error::ConfigurationInvalid(_) => ErrorKind::ConfigurationInvalid,
        }
    }

    /// `true` when the failure says nothing about the token itself.
    ///
    /// Only key-set fetch failures qualify: the same token may verify once
    /// the provider's endpoint is reachable again. Every other error is a
    /// verdict on the token (or on the configuration) and must not be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::KeySetFetch(_))
    }
}

impl From<Malformed> for Error {
    fn from(err: Malformed) -> Self {
        Error::MalformedToken(err)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::KeySetFetch(err)
    }
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "<missing>".to_string(),
    }
}

/// Result type alias for jwkverify operations
pub type Result<T> = std::result::Result<T, Error>;
