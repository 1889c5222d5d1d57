//! Signature algorithms and verification
//!
//! Only the RSASSA-PKCS1-v1_5 family is supported. The algorithm used for a
//! verification always comes from configuration; the token header's `alg` is
//! merely compared against it before any key is touched.

use crate::error::{Error, Result};
use crate::jwks::jwk::{Jwk, PublicKey};

use aws_lc_rs::signature::{self, UnparsedPublicKey};

/// Algorithm identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    RS256,
    RS384,
    RS512,
}

impl Algorithm {
    /// Convert to the JOSE `alg` string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
        }
    }

    /// JWK `kty` required by keys used with this algorithm
    pub(crate) const fn key_type(&self) -> &'static str {
        "RSA"
    }

    fn verification_algorithm(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            Algorithm::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            Algorithm::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            Algorithm::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }

    /// Run the signature primitive.
    ///
    /// Returns `false` for any signature that does not verify; this never
    /// errors. Key material problems are caught earlier, when the
    /// [`PublicKey`] is built.
    pub(crate) fn verify_signature(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        key: &PublicKey,
    ) -> bool {
        UnparsedPublicKey::new(self.verification_algorithm(), key.as_der())
            .verify(signing_input, signature)
            .is_ok()
    }
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            _ => Err(Error::UnsupportedAlgorithm {
                found: Some(s.into()),
            }),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Algorithm {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Verify `signature` over `signing_input` with the key described by `jwk`.
///
/// `Ok(false)` means the cryptographic check ran and failed.
/// `Err(InvalidKeyMaterial)` means no check could run at all.
pub(crate) fn verify_with_jwk(
    algorithm: Algorithm,
    signing_input: &[u8],
    signature: &[u8],
    jwk: &Jwk,
) -> Result<bool> {
    let key = jwk.to_public_key(algorithm)?;
    Ok(algorithm.verify_signature(signing_input, signature, &key))
}
