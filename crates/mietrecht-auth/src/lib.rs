//! Access-token verification for the Mietrecht services.
//!
//! This crate provides:
//! - Fixed-shape access-token claims (`AccessClaims`)
//! - HS256 encoding and decoding against the shared signing secret
//! - Bearer header parsing and IP-binding helpers
//!
//! # Example
//!
//! ```rust
//! use mietrecht_auth::{decode_token, encode_token, extract_bearer, AccessClaims};
//!
//! let secret = b"shared-secret";
//! let claims = AccessClaims::builder()
//!     .subject("user-123")
//!     .scopes(vec!["documents:read"])
//!     .expires_in_secs(900)
//!     .build();
//!
//! let token = encode_token(&claims, secret).unwrap();
//! let header = format!("Bearer {token}");
//! let decoded = decode_token(extract_bearer(Some(&header)).unwrap(), secret).unwrap();
//! assert_eq!(decoded.sub, "user-123");
//! ```

mod binding;
mod claims;
mod error;
mod jwt;

// Re-export public API
pub use binding::{hash_ip, ip_matches};
pub use claims::{AccessClaims, AccessClaimsBuilder};
pub use error::{AuthError, AuthFailureKind};
pub use jwt::{decode_token, decode_token_with_config, encode_token, extract_bearer, ValidationConfig};
