//! Device and network binding helpers.

use sha2::{Digest, Sha256};

/// Hash a network address the way the issuer stores it in `ip_hash`.
///
/// Returns the lowercase hex SHA-256 digest of the address string.
#[must_use]
pub fn hash_ip(ip: &str) -> String {
    hex::encode(Sha256::digest(ip.as_bytes()))
}

/// Check whether a request address matches a token's `ip_hash`.
#[must_use]
pub fn ip_matches(ip: &str, ip_hash: &str) -> bool {
    hash_ip(ip).eq_ignore_ascii_case(ip_hash)
}
