//! Base64URL decoding per RFC 4648
//!
//! Thin wrapper around the `base64` crate with size limits. Padding is
//! accepted but not required, so `eyJhIjoxfQ` and `eyJhIjoxfQ==` decode alike.

use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};

/// URL-safe alphabet, padding optional on decode, never emitted on encode
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a Base64URL value was rejected
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DecodeError {
    Invalid(String),
    TooLarge { size: usize, max: usize },
}

/// Decode Base64URL string to bytes with maximum size limit
pub(crate) fn decode_bytes(input: &str, max_size: usize) -> Result<Vec<u8>, DecodeError> {
    // Reject before allocating: every 4 input chars yield at most 3 bytes
    let upper_bound = input.len().div_ceil(4) * 3;
    if upper_bound > max_size + 2 {
        return Err(DecodeError::TooLarge {
            size: upper_bound,
            max: max_size,
        });
    }

    let result = URL_SAFE_LENIENT
        .decode(input)
        .map_err(|e| DecodeError::Invalid(e.to_string()))?;

    if result.len() > max_size {
        return Err(DecodeError::TooLarge {
            size: result.len(),
            max: max_size,
        });
    }

    Ok(result)
}

/// Encode bytes as unpadded Base64URL
#[cfg(test)]
pub(crate) fn encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(input)
}
