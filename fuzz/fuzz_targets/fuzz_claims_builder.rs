//! Fuzz target for the access claims builder.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_claims_builder -- -max_total_time=600

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mietrecht_auth::{decode_token, encode_token, AccessClaims};

const SECRET: &[u8] = b"fuzz-secret";

#[derive(Arbitrary, Debug)]
struct ClaimsInput {
    subject: String,
    issuer: Option<String>,
    scopes: Vec<String>,
    device_id: Option<String>,
    expiration_secs: Option<i64>,
}

fuzz_target!(|input: ClaimsInput| {
    if input.subject.len() > 1000 || input.scopes.iter().any(|s| s.len() > 100) {
        return;
    }

    let mut builder = AccessClaims::builder()
        .subject(&input.subject)
        .scopes(input.scopes.clone());

    if let Some(ref iss) = input.issuer {
        builder = builder.issuer(iss);
    }
    if let Some(ref device) = input.device_id {
        builder = builder.device_id(device);
    }
    if let Some(exp) = input.expiration_secs {
        if exp > 0 && exp < 86400 * 365 {
            builder = builder.expires_in_secs(exp);
        }
    }

    let claims = builder.build();
    assert_eq!(claims.sub, input.subject);
    assert_eq!(claims.iss, input.issuer);
    for scope in &input.scopes {
        assert!(claims.has_scope(scope));
    }

    let _ = serde_json::to_string(&claims);

    // Anything we sign must verify back to the same claims, except a blank
    // subject which verification refuses.
    let token = encode_token(&claims, SECRET).expect("non-empty secret");
    match decode_token(&token, SECRET) {
        Ok(decoded) => assert_eq!(decoded, claims),
        Err(_) => assert!(claims.sub.trim().is_empty()),
    }
});
