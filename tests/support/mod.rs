//! Token and key set fixtures for integration tests
//!
//! Tokens are signed locally with a generated RSA key; no identity provider
//! is needed.
//!
//! ```rust,ignore
//! let key = TestKey::generate();
//! let token = TokenBuilder::new(&key, "k1")
//!     .audience(AUDIENCE)
//!     .expires_in(3600)
//!     .sign();
//! ```

#![allow(dead_code)]

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self, RsaKeyPair};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const AUDIENCE: &str = "https://app.example/";
pub const JWKS_PATH: &str = "/v2/jwks";

/// RSA key pair with its PKCS#8 encoding and public numbers
pub struct TestKey {
    key_pair: RsaKeyPair,
    pkcs8_pem: String,
    n: Vec<u8>,
    e: Vec<u8>,
}

impl TestKey {
    /// Generate a fresh 2048-bit key
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let private = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key");
        let pkcs8_der = private.to_pkcs8_der().expect("encode PKCS#8");
        let key_pair = RsaKeyPair::from_pkcs8(pkcs8_der.as_bytes()).expect("load key pair");
        let pkcs8_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode PEM")
            .to_string();

        Self {
            key_pair,
            pkcs8_pem,
            n: private.n().to_bytes_be(),
            e: private.e().to_bytes_be(),
        }
    }

    /// Key shared by every test in the binary
    pub fn shared() -> &'static TestKey {
        static KEY: OnceLock<TestKey> = OnceLock::new();
        KEY.get_or_init(TestKey::generate)
    }

    /// A second key, for "signed by someone else" cases
    pub fn other() -> &'static TestKey {
        static KEY: OnceLock<TestKey> = OnceLock::new();
        KEY.get_or_init(TestKey::generate)
    }

    /// Private key as PKCS#8 PEM, for other JWT libraries
    pub fn private_pem(&self) -> &str {
        &self.pkcs8_pem
    }

    /// RS256 signature over `message`
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut sig = vec![0u8; self.key_pair.public_modulus_len()];
        self.key_pair
            .sign(
                &signature::RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                message,
                &mut sig,
            )
            .expect("sign");
        sig
    }

    /// Public JWK for this key
    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "alg": "RS256",
            "n": b64(&self.n),
            "e": b64(&self.e),
        })
    }
}

/// Key set document from `(key, kid)` pairs
pub fn key_set(keys: &[(&TestKey, &str)]) -> String {
    let keys: Vec<Value> = keys.iter().map(|(key, kid)| key.jwk(kid)).collect();
    json!({ "keys": keys }).to_string()
}

/// Builder for RS256 tokens signed with a [`TestKey`]
pub struct TokenBuilder<'k> {
    key: &'k TestKey,
    header: Value,
    claims: Value,
}

impl<'k> TokenBuilder<'k> {
    /// Token signed by `key`, announcing `kid`, with valid default claims
    pub fn new(key: &'k TestKey, kid: &str) -> Self {
        Self {
            key,
            header: json!({ "alg": "RS256", "typ": "JWT", "kid": kid }),
            claims: json!({
                "aud": AUDIENCE,
                "sub": "fid:1234",
                "exp": now() + 3600,
            }),
        }
    }

    /// Set the audience claim
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.claims["aud"] = json!(aud.into());
        self
    }

    /// Set the issuer claim
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.claims["iss"] = json!(iss.into());
        self
    }

    /// Set the expiration time (Unix timestamp)
    pub fn expiration(mut self, exp: i64) -> Self {
        self.claims["exp"] = json!(exp);
        self
    }

    /// Expire `seconds` from now (negative for the past)
    pub fn expires_in(self, seconds: i64) -> Self {
        self.expiration(now() + seconds)
    }

    /// Set the header `alg`
    pub fn algorithm(mut self, alg: &str) -> Self {
        self.header["alg"] = json!(alg);
        self
    }

    /// Set a header member
    pub fn header(mut self, key: &str, value: Value) -> Self {
        self.header[key] = value;
        self
    }

    /// Set a custom claim
    pub fn claim(mut self, key: &str, value: Value) -> Self {
        self.claims[key] = value;
        self
    }

    /// Remove a claim
    pub fn without_claim(mut self, key: &str) -> Self {
        if let Some(claims) = self.claims.as_object_mut() {
            claims.remove(key);
        }
        self
    }

    pub fn claims(&self) -> &Value {
        &self.claims
    }

    /// Encode and sign
    pub fn sign(self) -> String {
        let signing_input = format!(
            "{}.{}",
            b64(self.header.to_string()),
            b64(self.claims.to_string())
        );
        let signature = self.key.sign(signing_input.as_bytes());
        format!("{signing_input}.{}", b64(signature))
    }
}

/// Current Unix timestamp
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

pub fn b64(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Copy of `token` with bit `bit` of the decoded signature flipped
pub fn flip_signature_bit(token: &str, bit: usize) -> String {
    let (signing_input, signature) = token.rsplit_once('.').expect("three segments");
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).expect("signature b64");
    bytes[bit / 8] ^= 1 << (bit % 8);
    format!("{signing_input}.{}", b64(bytes))
}

/// Install a `tracing` subscriber once so failing tests show pipeline logs
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
