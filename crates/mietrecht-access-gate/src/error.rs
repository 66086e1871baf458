//! Gate error types and HTTP response handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mietrecht_auth::AuthError;
use serde::Serialize;

/// Reasons the gate rejects a request.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Credential missing, malformed, expired, or signature-invalid.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Risk score above the deny threshold.
    #[error("risk score {score} exceeds threshold {threshold}")]
    HighRiskBlocked { score: f64, threshold: f64 },

    /// Required permission absent from the access context.
    #[error("missing permission: {0}")]
    PermissionDenied(String),

    /// Anything else that went wrong inside the gate.
    #[error("unexpected gate failure: {0}")]
    Unexpected(String),
}

/// Structured error response returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl GateError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) | Self::Unexpected(_) => StatusCode::UNAUTHORIZED,
            Self::HighRiskBlocked { .. } | Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Returns the error category string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Authentication(_) | Self::Unexpected(_) => "Unauthorized",
            Self::HighRiskBlocked { .. } | Self::PermissionDenied(_) => "AccessDenied",
        }
    }

    /// Returns a sanitized message safe to return to clients.
    ///
    /// Authentication failures keep their kind (missing / invalid / expired
    /// token); scores and internal causes are never exposed.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Authentication(e) => e.kind().message(),
            Self::HighRiskBlocked { .. } => "access denied",
            Self::PermissionDenied(_) => "insufficient permissions",
            Self::Unexpected(_) => "authentication failed",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            message: self.client_message().to_string(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GateError::Authentication(AuthError::MissingToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GateError::HighRiskBlocked {
                score: 85.0,
                threshold: 80.0
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GateError::PermissionDenied("admin".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GateError::Unexpected("boom".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GateError::Authentication(AuthError::TokenExpired).error_code(),
            "Unauthorized"
        );
        assert_eq!(
            GateError::HighRiskBlocked {
                score: 85.0,
                threshold: 80.0
            }
            .error_code(),
            "AccessDenied"
        );
        assert_eq!(GateError::Unexpected("x".into()).error_code(), "Unauthorized");
    }

    #[test]
    fn test_authentication_messages_keep_kind() {
        assert_eq!(
            GateError::from(AuthError::MissingToken).client_message(),
            "missing token"
        );
        assert_eq!(
            GateError::from(AuthError::TokenExpired).client_message(),
            "expired token"
        );
        assert_eq!(
            GateError::from(AuthError::InvalidSignature).client_message(),
            "invalid token"
        );
        assert_eq!(
            GateError::from(AuthError::DeviceMismatch).client_message(),
            "invalid token"
        );
    }

    #[test]
    fn test_client_messages_are_sanitized() {
        let err = GateError::HighRiskBlocked {
            score: 85.0,
            threshold: 80.0,
        };
        assert_eq!(err.to_string(), "risk score 85 exceeds threshold 80");
        assert!(!err.client_message().contains("85"));

        let err = GateError::Unexpected("identity store panicked at lookup.rs".into());
        assert_eq!(err.client_message(), "authentication failed");
    }

    #[test]
    fn test_into_response_status() {
        let response = GateError::from(AuthError::MissingToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
