//! Access-token claims.
//!
//! `AccessClaims` is the fixed shape every bearer token must decode into.
//! Tokens whose payload does not match (wrong types, missing `sub`/`exp`/`iat`)
//! are rejected at the verification boundary.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a Mietrecht access token.
///
/// # Standard Claims (RFC 7519)
///
/// - `sub`: Subject, the identity id of the principal
/// - `exp`: Expiration time (Unix timestamp)
/// - `iat`: Issued at (Unix timestamp)
/// - `jti`: Token id
/// - `iss`: Issuer (optional)
///
/// # Custom Claims
///
/// - `scopes`: Granted permission set
/// - `device_id`: Device the token was issued to
/// - `ip_hash`: Hex SHA-256 of the address the token was issued to
///
/// # Example
///
/// ```rust
/// use mietrecht_auth::AccessClaims;
///
/// let claims = AccessClaims::builder()
///     .subject("tenant-42")
///     .scopes(vec!["documents:read", "chat:write"])
///     .expires_in_secs(900)
///     .build();
///
/// assert!(claims.has_scope("chat:write"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject - the identity id.
    pub sub: String,

    /// Expiration time as Unix timestamp.
    pub exp: i64,

    /// Issued at as Unix timestamp.
    pub iat: i64,

    /// Token id.
    #[serde(default)]
    pub jti: String,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Granted permission scopes.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Email address of the principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Account type (tenant, landlord, lawyer, business).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,

    /// Login session the token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Device the token is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Hashed issuing IP, for monitoring only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,
}

impl AccessClaims {
    /// Create a new builder for constructing access claims.
    #[must_use]
    pub fn builder() -> AccessClaimsBuilder {
        AccessClaimsBuilder::default()
    }

    /// Check if the token is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Check if the claims grant a specific scope.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Builder for constructing access claims.
#[derive(Debug, Default)]
pub struct AccessClaimsBuilder {
    sub: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    jti: Option<String>,
    iss: Option<String>,
    scopes: Vec<String>,
    email: Option<String>,
    user_type: Option<String>,
    session_id: Option<String>,
    device_id: Option<String>,
    ip_hash: Option<String>,
}

impl AccessClaimsBuilder {
    /// Set the subject (identity id).
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set expiration time as Unix timestamp.
    #[must_use]
    pub fn expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set expiration time as seconds from now.
    #[must_use]
    pub fn expires_in_secs(mut self, secs: i64) -> Self {
        self.exp = Some(Utc::now().timestamp() + secs);
        self
    }

    /// Set expiration time using a Duration.
    #[must_use]
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.exp = Some((Utc::now() + duration).timestamp());
        self
    }

    /// Set the issued at time.
    #[must_use]
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set the token id.
    #[must_use]
    pub fn jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Set the issuer.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Set the granted scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: Vec<impl Into<String>>) -> Self {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Add a single scope.
    #[must_use]
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Set the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the account type.
    #[must_use]
    pub fn user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    /// Set the session id.
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Bind the token to a device.
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Record the issuing address (already hashed, see [`crate::hash_ip`]).
    #[must_use]
    pub fn ip_hash(mut self, ip_hash: impl Into<String>) -> Self {
        self.ip_hash = Some(ip_hash.into());
        self
    }

    /// Build the access claims.
    ///
    /// # Defaults
    ///
    /// - `sub`: Empty string if not set (rejected by the verifier)
    /// - `exp`: 15 minutes from now if not set
    /// - `iat`: Current time if not set
    /// - `jti`: New UUID v4 if not set
    #[must_use]
    pub fn build(self) -> AccessClaims {
        let now = Utc::now().timestamp();

        AccessClaims {
            sub: self.sub.unwrap_or_default(),
            exp: self.exp.unwrap_or(now + 900),
            iat: self.iat.unwrap_or(now),
            jti: self.jti.unwrap_or_else(|| Uuid::new_v4().to_string()),
            iss: self.iss,
            scopes: self.scopes,
            email: self.email,
            user_type: self.user_type,
            session_id: self.session_id,
            device_id: self.device_id,
            ip_hash: self.ip_hash,
        }
    }
}
