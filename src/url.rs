//! URL validation utilities
//!
//! The key set URL is the only network location the verifier ever contacts,
//! so it is checked once, when the configuration is validated.

use crate::error::{Error, Result};
use crate::limits::MAX_JWKS_URI_LENGTH;

/// Common URL validation logic
fn validate_url_common(url: &str, max_length: usize, name: &str) -> Result<url::Url> {
    if url.trim().is_empty() {
        return Err(Error::ConfigurationInvalid(format!("{name} cannot be empty")));
    }

    if url.len() > max_length {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} too long: {} characters (maximum: {max_length})",
            url.len()
        )));
    }

    let parsed = url
        .parse::<url::Url>()
        .map_err(|e| Error::ConfigurationInvalid(format!("invalid {name}: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} must use http or https scheme"
        )));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::ConfigurationInvalid(format!(
            "{name} must have a valid host"
        )));
    }

    Ok(parsed)
}

/// Validate key set URL format and size
pub(crate) fn validate_jwks_uri(uri: &str) -> Result<()> {
    validate_url_common(uri, MAX_JWKS_URI_LENGTH, "key set URL")?;
    Ok(())
}
