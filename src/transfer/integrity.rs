//! SHA-512 integrity gate for the reassembled payload.

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-512 of `data`.
///
/// # Example
///
/// ```
/// use account_transfer::transfer::sha512_hex;
///
/// assert!(sha512_hex(b"abc").starts_with("ddaf35a193617aba"));
/// ```
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}

/// Check `data` against an expected hex digest.
///
/// The comparison runs over the full digest regardless of where the first
/// difference is. Hex case is ignored.
pub fn digest_matches(data: &[u8], expected_hex: &str) -> bool {
    let computed = sha512_hex(data);
    let expected = expected_hex.to_ascii_lowercase();
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}
