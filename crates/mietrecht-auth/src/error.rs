//! Error types for credential verification.
//!
//! Provides explicit error variants for all bearer-token failures.

use thiserror::Error;

/// User-visible category of an authentication failure.
///
/// Every [`AuthError`] collapses into exactly one of these, which is what the
/// caller of a protected endpoint gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    /// No bearer credential was presented.
    MissingToken,
    /// The credential did not verify (signature, structure, claims, binding).
    InvalidToken,
    /// The credential verified but its expiry has passed.
    ExpiredToken,
}

impl AuthFailureKind {
    /// Short message distinguishing the failure kind.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            AuthFailureKind::MissingToken => "missing token",
            AuthFailureKind::InvalidToken => "invalid token",
            AuthFailureKind::ExpiredToken => "expired token",
        }
    }
}

/// Authentication error types.
///
/// Each variant maps to a specific failure mode of bearer verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` credential on the request.
    #[error("Missing bearer token")]
    MissingToken,

    /// Token has expired (exp claim is in the past).
    #[error("Token has expired")]
    TokenExpired,

    /// Token signature is invalid.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token format is malformed or its claims do not have the expected shape.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token uses an unsupported algorithm (only HS256 is allowed).
    #[error("Unsupported algorithm: only HS256 is allowed")]
    InvalidAlgorithm,

    /// Required claim is missing from token.
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// Signing secret is unusable.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Token is bound to a different device than the one presenting it.
    #[error("Token device binding does not match the presenting device")]
    DeviceMismatch,
}

impl AuthError {
    /// Check if this error indicates an expired token.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, AuthError::TokenExpired)
    }

    /// Check if this error indicates an absent credential.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, AuthError::MissingToken)
    }

    /// The user-visible failure kind for this error.
    #[must_use]
    pub fn kind(&self) -> AuthFailureKind {
        match self {
            AuthError::MissingToken => AuthFailureKind::MissingToken,
            AuthError::TokenExpired => AuthFailureKind::ExpiredToken,
            AuthError::InvalidSignature
            | AuthError::InvalidToken(_)
            | AuthError::InvalidAlgorithm
            | AuthError::MissingClaim(_)
            | AuthError::InvalidKey(_)
            | AuthError::DeviceMismatch => AuthFailureKind::InvalidToken,
        }
    }
}
