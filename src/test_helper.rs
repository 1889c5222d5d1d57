//! Shared RSA fixture for unit tests

use crate::algorithm::Algorithm;
use crate::jwks::jwk::Jwk;
use crate::utils::base64url::encode;
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self, RsaKeyPair};
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use std::sync::OnceLock;

/// A 2048-bit RSA key pair, generated once per test binary
pub(crate) struct TestKey {
    key_pair: RsaKeyPair,
    n: Vec<u8>,
    e: Vec<u8>,
}

impl TestKey {
    pub(crate) fn shared() -> &'static TestKey {
        static KEY: OnceLock<TestKey> = OnceLock::new();
        KEY.get_or_init(TestKey::generate)
    }

    fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let private = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key");
        let pkcs8 = private.to_pkcs8_der().expect("encode PKCS#8");
        let key_pair = RsaKeyPair::from_pkcs8(pkcs8.as_bytes()).expect("load key pair");

        Self {
            key_pair,
            n: private.n().to_bytes_be(),
            e: private.e().to_bytes_be(),
        }
    }

    /// Sign `message` with `algorithm`
    pub(crate) fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Vec<u8> {
        let padding: &'static dyn signature::RsaEncoding = match algorithm {
            Algorithm::RS256 => &signature::RSA_PKCS1_SHA256,
            Algorithm::RS384 => &signature::RSA_PKCS1_SHA384,
            Algorithm::RS512 => &signature::RSA_PKCS1_SHA512,
        };
        let mut sig = vec![0u8; self.key_pair.public_modulus_len()];
        self.key_pair
            .sign(padding, &SystemRandom::new(), message, &mut sig)
            .expect("sign");
        sig
    }

    /// Public half as a JWK record
    pub(crate) fn jwk(&self, kid: &str) -> Jwk {
        Jwk {
            kty: Some("RSA".into()),
            kid: Some(kid.into()),
            alg: None,
            key_use: Some("sig".into()),
            n: Some(encode(&self.n)),
            e: Some(encode(&self.e)),
        }
    }

    /// Key set document publishing this key under every `kid`
    pub(crate) fn key_set(&self, kids: &[&str]) -> String {
        let keys: Vec<String> = kids
            .iter()
            .map(|kid| {
                format!(
                    r#"{{"kty":"RSA","kid":"{kid}","use":"sig","alg":"RS256","n":"{}","e":"{}"}}"#,
                    encode(&self.n),
                    encode(&self.e)
                )
            })
            .collect();
        format!(r#"{{"keys":[{}]}}"#, keys.join(","))
    }

    /// Compact RS256 token over the given header and payload JSON
    pub(crate) fn token(&self, header: &str, payload: &str) -> String {
        let signing_input = format!("{}.{}", encode(header), encode(payload));
        let signature = self.sign(Algorithm::RS256, signing_input.as_bytes());
        format!("{signing_input}.{}", encode(signature))
    }
}
