//! JWT encoding and decoding with the HS256 algorithm.
//!
//! Access tokens are signed with a shared secret held by the issuing
//! auth service and every verifying service.

use crate::claims::AccessClaims;
use crate::error::AuthError;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};

/// Configuration for JWT validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Leeway in seconds for exp validation (clock skew tolerance).
    pub leeway: u64,
    /// Expected issuer (if set, tokens with a different issuer are rejected).
    pub issuer: Option<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            leeway: 0,
            issuer: None,
        }
    }
}

impl ValidationConfig {
    /// Create a new validation config with custom leeway.
    #[must_use]
    pub fn with_leeway(leeway: u64) -> Self {
        Self {
            leeway,
            ..Default::default()
        }
    }

    /// Set the expected issuer.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.issuer = Some(iss.into());
        self
    }
}

/// Encode access claims into a signed token string using HS256.
///
/// # Errors
///
/// Returns `AuthError::InvalidKey` if the secret is empty.
///
/// # Example
///
/// ```rust
/// use mietrecht_auth::{encode_token, AccessClaims};
///
/// let claims = AccessClaims::builder()
///     .subject("user-123")
///     .expires_in_secs(3600)
///     .build();
///
/// let token = encode_token(&claims, b"top-secret").unwrap();
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn encode_token(claims: &AccessClaims, secret: &[u8]) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidKey("Signing secret is empty".to_string()));
    }

    let key = EncodingKey::from_secret(secret);
    let header = Header::new(Algorithm::HS256);

    encode(&header, claims, &key)
        .map_err(|e| AuthError::InvalidToken(format!("Encoding failed: {}", e)))
}

/// Decode and validate an access token with the default validation config.
///
/// # Errors
///
/// - `AuthError::TokenExpired` - Token has expired
/// - `AuthError::InvalidSignature` - Signature verification failed
/// - `AuthError::InvalidToken` - Token format or claim shape is invalid
/// - `AuthError::InvalidAlgorithm` - Token uses an algorithm other than HS256
/// - `AuthError::MissingClaim` - A required claim is absent or empty
/// - `AuthError::InvalidKey` - Secret is empty
pub fn decode_token(token: &str, secret: &[u8]) -> Result<AccessClaims, AuthError> {
    decode_token_with_config(token, secret, &ValidationConfig::default())
}

/// Decode and validate an access token with a custom validation config.
pub fn decode_token_with_config(
    token: &str,
    secret: &[u8],
    config: &ValidationConfig,
) -> Result<AccessClaims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidKey("Verification secret is empty".to_string()));
    }

    let key = DecodingKey::from_secret(secret);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway;
    validation.validate_aud = false;

    // Only accept HS256
    validation.algorithms = vec![Algorithm::HS256];

    if let Some(ref iss) = config.issuer {
        validation.set_issuer(&[iss]);
    }

    let token_data: TokenData<AccessClaims> =
        decode(token, &key, &validation).map_err(map_jwt_error)?;

    let claims = token_data.claims;
    if claims.sub.trim().is_empty() {
        return Err(AuthError::MissingClaim("sub".to_string()));
    }

    Ok(claims)
}

/// Extract the bearer token from an `Authorization` header value.
///
/// An absent header, a non-Bearer scheme, or an empty token all count as
/// no credential at all.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Map jsonwebtoken errors to AuthError.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => AuthError::InvalidAlgorithm,
        ErrorKind::InvalidToken => AuthError::InvalidToken("Malformed token".to_string()),
        ErrorKind::InvalidIssuer => AuthError::InvalidToken("Unexpected issuer".to_string()),
        ErrorKind::Base64(_) => AuthError::InvalidToken("Invalid base64 encoding".to_string()),
        ErrorKind::Json(_) => AuthError::InvalidToken("Unexpected claims shape".to_string()),
        ErrorKind::Utf8(_) => AuthError::InvalidToken("Invalid UTF-8 in token".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.to_string()),
        _ => AuthError::InvalidToken(format!("Token validation failed: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const TEST_SECRET: &[u8] = b"mietrecht-test-secret-0123456789";
    const WRONG_SECRET: &[u8] = b"some-other-secret-9876543210";

    #[test]
    fn test_encode_token_valid_claims() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .expires_in_secs(3600)
            .build();

        let token = encode_token(&claims, TEST_SECRET).unwrap();

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_encode_token_empty_secret() {
        let claims = AccessClaims::builder().subject("user-123").build();

        let result = encode_token(&claims, b"");

        assert!(matches!(result.unwrap_err(), AuthError::InvalidKey(_)));
    }

    #[test]
    fn test_decode_token_valid() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .scopes(vec!["documents:read", "admin"])
            .device_id("device-1")
            .expires_in_secs(3600)
            .build();

        let token = encode_token(&claims, TEST_SECRET).unwrap();
        let decoded = decode_token(&token, TEST_SECRET).unwrap();

        assert_eq!(decoded, claims);
        assert!(decoded.has_scope("admin"));
    }

    #[test]
    fn test_decode_token_expired() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .expiration(Utc::now().timestamp() - 3600)
            .build();

        let token = encode_token(&claims, TEST_SECRET).unwrap();
        let result = decode_token(&token, TEST_SECRET);

        assert!(matches!(result.unwrap_err(), AuthError::TokenExpired));
    }

    #[test]
    fn test_decode_token_with_leeway() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .expiration(Utc::now().timestamp() - 30)
            .build();
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        assert!(matches!(
            decode_token(&token, TEST_SECRET).unwrap_err(),
            AuthError::TokenExpired
        ));

        let config = ValidationConfig::with_leeway(60);
        assert!(decode_token_with_config(&token, TEST_SECRET, &config).is_ok());
    }

    #[test]
    fn test_decode_token_invalid_signature() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .expires_in_secs(3600)
            .build();

        let token = encode_token(&claims, TEST_SECRET).unwrap();
        let result = decode_token(&token, WRONG_SECRET);

        assert!(matches!(result.unwrap_err(), AuthError::InvalidSignature));
    }

    #[test]
    fn test_decode_token_malformed() {
        let result = decode_token("not.a.valid.token", TEST_SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));

        let result = decode_token("garbage", TEST_SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_decode_token_rejects_empty_subject() {
        let claims = AccessClaims::builder().expires_in_secs(3600).build();
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        let result = decode_token(&token, TEST_SECRET);

        assert_eq!(result.unwrap_err(), AuthError::MissingClaim("sub".into()));
    }

    #[test]
    fn test_decode_token_rejects_foreign_claims_shape() {
        #[derive(serde::Serialize)]
        struct LegacyPayload {
            #[serde(rename = "userId")]
            user_id: String,
            exp: i64,
        }

        let payload = LegacyPayload {
            user_id: "user-123".into(),
            exp: Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        let result = decode_token(&token, TEST_SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_decode_token_rejects_other_algorithm() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .expires_in_secs(3600)
            .build();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        let result = decode_token(&token, TEST_SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidAlgorithm));
    }

    #[test]
    fn test_validation_config_issuer() {
        let claims = AccessClaims::builder()
            .subject("user-123")
            .issuer("mietrecht-auth")
            .expires_in_secs(3600)
            .build();
        let token = encode_token(&claims, TEST_SECRET).unwrap();

        let config = ValidationConfig::default().issuer("mietrecht-auth");
        assert!(decode_token_with_config(&token, TEST_SECRET, &config).is_ok());

        let config = ValidationConfig::default().issuer("someone-else");
        assert!(decode_token_with_config(&token, TEST_SECRET, &config).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_bearer(None), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Bearer ")), Err(AuthError::MissingToken));
        assert_eq!(
            extract_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MissingToken)
        );
    }
}
