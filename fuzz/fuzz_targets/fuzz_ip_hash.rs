//! Fuzz target for network address hashing.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_ip_hash -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use mietrecht_auth::{hash_ip, ip_matches};

fuzz_target!(|ip: &str| {
    let hash = hash_ip(ip);

    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(hash, hash_ip(ip));

    assert!(ip_matches(ip, &hash));
    assert!(ip_matches(ip, &hash.to_ascii_uppercase()));
});
