//! DER encoding for RSA JWK material
//!
//! Uses the RustCrypto `spki` and `der` crates to wrap a JWK's modulus and
//! exponent in the SubjectPublicKeyInfo structure aws-lc-rs expects.

use crate::limits::{MAX_RSA_MODULUS_BITS, MIN_RSA_MODULUS_BITS};
use der::{Encode, Sequence, asn1::UintRef};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

/// rsaEncryption (PKCS #1)
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// RSAPublicKey as defined in RFC 8017:
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// Build a DER-encoded SubjectPublicKeyInfo from big-endian `n` and `e`.
///
/// The error is a human-readable reason, attached by the caller to the
/// offending `kid`.
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>, String> {
    let n = strip_leading_zeros(n);
    let e = strip_leading_zeros(e);

    if n.is_empty() {
        return Err("modulus is zero or empty".into());
    }
    if e.is_empty() {
        return Err("exponent is zero or empty".into());
    }

    let bits = bit_length(n);
    if !(MIN_RSA_MODULUS_BITS..=MAX_RSA_MODULUS_BITS).contains(&bits) {
        return Err(format!(
            "modulus is {bits} bits (accepted: {MIN_RSA_MODULUS_BITS}-{MAX_RSA_MODULUS_BITS})"
        ));
    }
    if e.len() > 4 || e[e.len() - 1] & 1 == 0 {
        return Err("exponent must be odd and at most 32 bits".into());
    }

    let rsa_pubkey = RsaPublicKey {
        modulus: UintRef::new(n).map_err(|err| format!("modulus: {err}"))?,
        public_exponent: UintRef::new(e).map_err(|err| format!("exponent: {err}"))?,
    };
    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|err| format!("RSAPublicKey encoding: {err}"))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: RSA_ENCRYPTION_OID,
            parameters: Some(der::asn1::AnyRef::NULL.into()),
        },
        subject_public_key: der::asn1::BitString::new(0, rsa_pubkey_der)
            .map_err(|err| format!("bit string: {err}"))?,
    };

    spki.to_der().map_err(|err| format!("SPKI encoding: {err}"))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Bit length of a big-endian integer without leading zero bytes
fn bit_length(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(&first) => (bytes.len() - 1) * 8 + (8 - first.leading_zeros() as usize),
        None => 0,
    }
}
