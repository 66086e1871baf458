//! Fuzz target for Authorization header parsing and token verification.
//!
//! Arbitrary header values must be rejected with an error, never a panic.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_bearer_token -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use mietrecht_auth::{decode_token, extract_bearer, AuthFailureKind};

fuzz_target!(|data: &[u8]| {
    let Ok(header) = std::str::from_utf8(data) else {
        return;
    };

    match extract_bearer(Some(header)) {
        Ok(token) => {
            assert!(!token.is_empty());
            if let Err(e) = decode_token(token, b"fuzz-secret") {
                assert_ne!(e.kind(), AuthFailureKind::MissingToken);
            }
        }
        Err(e) => assert_eq!(e.kind(), AuthFailureKind::MissingToken),
    }
});
