//! SHA-256 digests for stored content.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Compute the lowercase hex SHA-256 of `data`.
///
/// # Examples
///
/// ```
/// use assetgate_core::checksums::compute_sha256;
///
/// assert_eq!(
///     compute_sha256(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn compute_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Validate a client-supplied hex digest and return it lowercased.
///
/// Returns `None` unless the input is exactly 64 hex characters.
#[must_use]
pub fn normalize_hex_digest(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (trimmed.len() == SHA256_HEX_LEN && trimmed.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| trimmed.to_ascii_lowercase())
}

/// Compare two hex digests in constant time.
#[must_use]
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.as_bytes().ct_eq(actual.as_bytes()).into()
}
