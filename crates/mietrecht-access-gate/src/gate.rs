//! The access risk gate.
//!
//! Per request: verify the bearer credential, build the access context,
//! score it, then allow, allow with a warning, or deny.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use futures::FutureExt;
use mietrecht_auth::{decode_token_with_config, extract_bearer, ip_matches, AuthError};

use crate::clock::Clock;
use crate::config::GateConfig;
use crate::context::{AccessContext, Identity, RequestMetadata};
use crate::error::GateError;
use crate::lookup::IdentityLookup;
use crate::risk::{RiskEngine, RiskLevel};

/// An admitted request.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub context: AccessContext,
    pub level: RiskLevel,
}

/// Verifies credentials and applies the risk policy.
///
/// Cheap to clone; all state is shared and read-only.
#[derive(Clone)]
pub struct AccessRiskGate {
    config: Arc<GateConfig>,
    engine: RiskEngine,
}

impl AccessRiskGate {
    pub fn new(
        config: Arc<GateConfig>,
        lookup: Arc<dyn IdentityLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let engine = RiskEngine::new(
            config.policy.clone(),
            lookup,
            clock,
            config.lookup_timeout,
        );
        Self { config, engine }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    /// Verify a raw bearer token against the configured secret.
    pub fn verify_credential(&self, raw_token: Option<&str>) -> Result<Identity, AuthError> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = decode_token_with_config(
            token,
            self.config.jwt_secret.as_bytes(),
            &self.config.validation(),
        )?;

        Ok(Identity::from(claims))
    }

    /// Run the full gate for one request.
    ///
    /// Never panics: a panic anywhere below is converted into
    /// [`GateError::Unexpected`], which the caller sees as 401.
    pub async fn gate(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<Admission, GateError> {
        match AssertUnwindSafe(self.evaluate(headers, peer))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(error = %detail, "access gate panicked");
                Err(GateError::Unexpected(detail))
            }
        }
    }

    async fn evaluate(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<Admission, GateError> {
        let metadata = RequestMetadata::from_request(headers, peer, &self.config);

        let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let identity = extract_bearer(auth_header)
            .and_then(|token| self.verify_credential(Some(token)))
            .and_then(|identity| self.check_bindings(identity, &metadata))
            .map_err(|e| {
                tracing::warn!(
                    network_address = %metadata.network_address,
                    error = %e,
                    "authentication failed"
                );
                GateError::Authentication(e)
            })?;

        let context = AccessContext::new(&identity, metadata);

        let score = self.engine.assess_risk(&context).await.map_err(|e| {
            tracing::error!(identity_id = %context.identity_id, error = %e, "risk assessment failed");
            GateError::Unexpected(e.to_string())
        })?;
        let context = context.with_risk_score(score);

        let level = self.engine.classify(score);
        match level {
            RiskLevel::High => {
                tracing::warn!(
                    identity_id = %context.identity_id,
                    risk_score = score,
                    "high risk access blocked"
                );
                return Err(GateError::HighRiskBlocked {
                    score,
                    threshold: self.engine.policy().deny_above,
                });
            }
            RiskLevel::Medium => {
                tracing::warn!(
                    identity_id = %context.identity_id,
                    risk_score = score,
                    "medium risk access"
                );
            }
            RiskLevel::Low => {}
        }

        Ok(Admission { context, level })
    }

    /// Device binding is enforced; IP binding is only monitored.
    fn check_bindings(
        &self,
        identity: Identity,
        metadata: &RequestMetadata,
    ) -> Result<Identity, AuthError> {
        if let (Some(expected), Some(presented)) =
            (identity.claims.device_id.as_deref(), metadata.device_id.as_deref())
        {
            if expected != presented {
                tracing::warn!(
                    identity_id = %identity.id,
                    expected_device_id = %expected,
                    presented_device_id = %presented,
                    "token device mismatch"
                );
                return Err(AuthError::DeviceMismatch);
            }
        }

        if let Some(ip_hash) = identity.claims.ip_hash.as_deref() {
            if !metadata.network_address.is_empty()
                && !ip_matches(&metadata.network_address, ip_hash)
            {
                tracing::warn!(
                    identity_id = %identity.id,
                    network_address = %metadata.network_address,
                    "token ip mismatch"
                );
            }
        }

        Ok(identity)
    }
}
