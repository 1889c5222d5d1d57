//! Size limit constants for input validation

/// Maximum length for a token string (16KB)
pub(crate) const MAX_TOKEN_LENGTH: usize = 16 * 1024;

/// Maximum length for key set URLs (2048 characters)
pub(crate) const MAX_JWKS_URI_LENGTH: usize = 2048;

/// Maximum size for a key set response (512KB)
pub(crate) const MAX_JWKS_RESPONSE_SIZE: usize = 512 * 1024;

/// Maximum number of keys in a key set (100 keys)
pub(crate) const MAX_JWK_SET_SIZE: usize = 100;

// ============================================================================
// Decoded token limits
// ============================================================================

/// Maximum size for decoded header JSON (8KB)
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Maximum size for decoded payload JSON (8KB)
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 8 * 1024;

/// Maximum size for decoded signature bytes (1KB)
/// An 8192-bit RSA signature is 1024 bytes
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

// ============================================================================
// JWK field limits
// ============================================================================

/// Maximum size for Base64URL-encoded RSA modulus (n) field
/// 8192-bit modulus encodes to 1366 characters
pub(crate) const MAX_JWK_N_SIZE: usize = 1400;

/// Maximum size for Base64URL-encoded RSA exponent (e) field
pub(crate) const MAX_JWK_E_SIZE: usize = 64;

/// Maximum length for key ID (kid) values, in tokens and key sets
pub(crate) const MAX_KID_LENGTH: usize = 256;

/// RSA modulus bounds accepted by the verifier (bits)
pub(crate) const MIN_RSA_MODULUS_BITS: usize = 2048;
pub(crate) const MAX_RSA_MODULUS_BITS: usize = 8192;
