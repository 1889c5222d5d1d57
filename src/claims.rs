//! Claims policy
//!
//! Cheap checks on already-decoded data, run before any key lookup or
//! signature work. Order: `alg`, `aud`, `exp`, then `iss` when configured.
//! Comparisons are exact string equality; there is no clock leeway.

use crate::algorithm::Algorithm;
use crate::config::VerifierConfig;
use crate::error::{Error, Result};
use crate::token::DecodedToken;
use miniserde::json::{Number, Object, Value};

/// Run every policy check against `token` at Unix time `now`
pub(crate) fn check_policy(
    token: &DecodedToken<'_>,
    config: &VerifierConfig,
    now: i64,
) -> Result<()> {
    check_algorithm(token.header(), config.algorithm)?;
    check_audience(token.payload(), &config.audience)?;
    check_expiration(token.payload(), now)?;
    if let Some(issuer) = config.issuer.as_deref() {
        check_issuer(token.payload(), issuer)?;
    }
    Ok(())
}

/// Header `alg` must name the configured algorithm
pub(crate) fn check_algorithm(header: &Object, expected: Algorithm) -> Result<()> {
    match header.get("alg") {
        Some(Value::String(alg)) if alg == expected.as_str() => Ok(()),
        found => Err(Error::UnsupportedAlgorithm {
            found: found.map(describe),
        }),
    }
}

/// `aud` must be a string equal to `expected`
pub(crate) fn check_audience(payload: &Object, expected: &str) -> Result<()> {
    match payload.get("aud") {
        Some(Value::String(aud)) if aud == expected => Ok(()),
        found => Err(Error::AudienceMismatch {
            found: found.map(describe),
            expected: expected.into(),
        }),
    }
}

/// `exp` must be numeric and strictly after `now`.
///
/// A fractional `exp` is truncated before the comparison, so `now + 0.9` is
/// already expired. This is stricter than comparing the raw number, on
/// purpose.
pub(crate) fn check_expiration(payload: &Object, now: i64) -> Result<()> {
    match numeric_member(payload, "exp") {
        Some(exp) if exp > now => Ok(()),
        exp => Err(Error::TokenExpired { exp, now }),
    }
}

/// `iss` must be a string equal to `expected`
pub(crate) fn check_issuer(payload: &Object, expected: &str) -> Result<()> {
    match payload.get("iss") {
        Some(Value::String(iss)) if iss == expected => Ok(()),
        found => Err(Error::IssuerMismatch {
            found: found.map(describe),
            expected: expected.into(),
        }),
    }
}

/// Integer value of a numeric member, fractions truncated toward zero
pub(crate) fn numeric_member(object: &Object, name: &str) -> Option<i64> {
    match object.get(name)? {
        Value::Number(Number::U64(n)) => Some(i64::try_from(*n).unwrap_or(i64::MAX)),
        Value::Number(Number::I64(n)) => Some(*n),
        // `as` saturates at the i64 bounds
        Value::Number(Number::F64(n)) => Some(n.trunc() as i64),
        _ => None,
    }
}

/// Claim value for diagnostics: strings verbatim, anything else as JSON
fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => miniserde::json::to_string(other),
    }
}
