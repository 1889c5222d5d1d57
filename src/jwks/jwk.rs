//! JWK (JSON Web Key) struct and conversion

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::limits::{MAX_JWK_E_SIZE, MAX_JWK_N_SIZE};
use crate::utils::base64url;
use miniserde::Deserialize;

/// JSON Web Key (JWK) as published in a key set
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Jwk {
    /// Key type (e.g., "RSA")
    pub kty: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm (advisory per RFC 7517, enforced when present)
    pub alg: Option<String>,
    /// Key use (RFC 7517 Section 4.2), "sig" or "enc"
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA exponent (Base64URL-encoded)
    pub e: Option<String>,
}

/// Public key ready for the signature primitive (DER SubjectPublicKeyInfo)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PublicKey(Vec<u8>);

impl PublicKey {
    pub(crate) fn as_der(&self) -> &[u8] {
        &self.0
    }
}

impl Jwk {
    /// Convert to a verification key for `algorithm`.
    ///
    /// Fails with [`Error::InvalidKeyMaterial`] when the record is not a
    /// signing key of the right type or its numbers do not form a usable key.
    pub(crate) fn to_public_key(&self, algorithm: Algorithm) -> Result<PublicKey> {
        self.check_usage(algorithm).map_err(|r| self.invalid(r))?;
        self.to_rsa_der()
            .map(PublicKey)
            .map_err(|r| self.invalid(r))
    }

    /// Key type, key use and advertised algorithm must all fit
    fn check_usage(&self, algorithm: Algorithm) -> std::result::Result<(), String> {
        let expected_kty = algorithm.key_type();
        match self.kty.as_deref() {
            Some(kty) if kty == expected_kty => {}
            Some(kty) => return Err(format!("key type {kty}, expected {expected_kty}")),
            None => return Err("missing key type (kty)".into()),
        }

        if let Some(use_val) = self.key_use.as_deref() {
            if use_val != "sig" {
                return Err(format!("key use '{use_val}' is not 'sig'"));
            }
        }

        if let Some(jwk_alg) = self.alg.as_deref() {
            if jwk_alg != algorithm.as_str() {
                return Err(format!(
                    "key is published for {jwk_alg}, configured algorithm is {algorithm}"
                ));
            }
        }

        Ok(())
    }

    fn to_rsa_der(&self) -> std::result::Result<Vec<u8>, String> {
        // Base64URL: 4 chars → 3 bytes
        const MAX_DECODED_JWK_N: usize = (MAX_JWK_N_SIZE * 3) / 4;
        const MAX_DECODED_JWK_E: usize = (MAX_JWK_E_SIZE * 3) / 4;

        let n = self.n.as_deref().ok_or("missing modulus (n)")?;
        let e = self.e.as_deref().ok_or("missing exponent (e)")?;

        if n.len() > MAX_JWK_N_SIZE {
            return Err(format!(
                "modulus field too large: {} bytes (maximum: {MAX_JWK_N_SIZE})",
                n.len()
            ));
        }
        if e.len() > MAX_JWK_E_SIZE {
            return Err(format!(
                "exponent field too large: {} bytes (maximum: {MAX_JWK_E_SIZE})",
                e.len()
            ));
        }

        let n_bytes = base64url::decode_bytes(n, MAX_DECODED_JWK_N)
            .map_err(|_| "modulus (n) is not valid base64url".to_string())?;
        let e_bytes = base64url::decode_bytes(e, MAX_DECODED_JWK_E)
            .map_err(|_| "exponent (e) is not valid base64url".to_string())?;

        crate::utils::der::rsa_spki_from_n_e(&n_bytes, &e_bytes)
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidKeyMaterial {
            kid: self.kid.clone().unwrap_or_default(),
            reason,
        }
    }
}
