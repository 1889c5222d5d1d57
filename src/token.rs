//! Token decoding
//!
//! Splits a compact token into its three segments and decodes them. Nothing
//! here is trusted yet: the header and payload are plain JSON objects until
//! the policy checks and the signature have passed.

use crate::error::{Malformed, Segment};
use crate::limits::{
    MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_TOKEN_LENGTH,
};
use crate::utils::base64url::{self, DecodeError};
use miniserde::json::{Object, Value};

/// A token split into its decoded parts
#[derive(Debug, Clone)]
pub(crate) struct DecodedToken<'a> {
    header: Object,
    payload: Object,
    signature: Vec<u8>,
    /// `header_b64 "." payload_b64`, sliced from the input as received
    signing_input: &'a str,
}

impl<'a> DecodedToken<'a> {
    /// Decode `token`.
    ///
    /// Fails when the token is not exactly three non-empty segments, a
    /// segment is not base64url, or the header or payload is not a JSON
    /// object.
    pub(crate) fn decode(token: &'a str) -> Result<Self, Malformed> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(Malformed::TooLarge {
                what: "token",
                size: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments[..] else {
            return Err(Malformed::SegmentCount {
                found: segments.len(),
            });
        };

        for (segment, value) in [
            (Segment::Header, header_b64),
            (Segment::Payload, payload_b64),
            (Segment::Signature, signature_b64),
        ] {
            if value.is_empty() {
                return Err(Malformed::EmptySegment { segment });
            }
        }

        let header = decode_object(header_b64, Segment::Header, MAX_DECODED_HEADER_SIZE)?;
        let payload = decode_object(payload_b64, Segment::Payload, MAX_DECODED_PAYLOAD_SIZE)?;
        let signature = decode_segment(
            signature_b64,
            Segment::Signature,
            MAX_DECODED_SIGNATURE_SIZE,
        )?;

        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];

        Ok(Self {
            header,
            payload,
            signature,
            signing_input,
        })
    }

    pub(crate) fn header(&self) -> &Object {
        &self.header
    }

    pub(crate) fn payload(&self) -> &Object {
        &self.payload
    }

    pub(crate) fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Exact bytes the signature covers
    pub(crate) fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    /// Header `kid`, when it is a string
    pub(crate) fn key_id(&self) -> Option<&str> {
        string_member(&self.header, "kid")
    }

    pub(crate) fn into_parts(self) -> (Object, Object) {
        (self.header, self.payload)
    }
}

/// String member of a JSON object; `None` when absent or not a string
pub(crate) fn string_member<'o>(object: &'o Object, name: &str) -> Option<&'o str> {
    match object.get(name) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn decode_segment(input: &str, segment: Segment, max: usize) -> Result<Vec<u8>, Malformed> {
    base64url::decode_bytes(input, max).map_err(|err| match err {
        DecodeError::Invalid(reason) => Malformed::Base64 { segment, reason },
        DecodeError::TooLarge { size, max } => Malformed::TooLarge {
            what: segment.as_str(),
            size,
            max,
        },
    })
}

fn decode_object(input: &str, segment: Segment, max: usize) -> Result<Object, Malformed> {
    let bytes = decode_segment(input, segment, max)?;
    let json = String::from_utf8(bytes).map_err(|_| Malformed::Utf8 { segment })?;
    miniserde::json::from_str::<Object>(&json).map_err(|_| Malformed::Json { segment })
}
