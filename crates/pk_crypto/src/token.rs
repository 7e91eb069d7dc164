//! Session token generation and constant-time comparison.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::rng;

const TOKEN_LEN: usize = 32;

/// Generate a base64-encoded 256-bit session token.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_LEN] = rng::random_array();
    STANDARD.encode(bytes)
}

/// Compare two byte strings in constant time. Unequal lengths compare false
/// without leaking where they differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
