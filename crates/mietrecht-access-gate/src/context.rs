//! Per-request access context.

use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use mietrecht_auth::AccessClaims;
use serde::Serialize;

use crate::config::GateConfig;

/// A verified principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub permissions: BTreeSet<String>,
    pub claims: AccessClaims,
}

impl From<AccessClaims> for Identity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub.clone(),
            permissions: claims.scopes.iter().cloned().collect(),
            claims,
        }
    }
}

/// Descriptive request metadata. None of it is cryptographically trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub network_address: String,
    pub client_descriptor: String,
    pub device_id: Option<String>,
    pub location: Option<String>,
}

impl RequestMetadata {
    /// Collect metadata from request headers and the socket peer.
    ///
    /// `X-Forwarded-For` is only consulted when the deployment trusts its
    /// proxy; otherwise the peer address is used.
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>, config: &GateConfig) -> Self {
        let peer_ip = peer.map(|addr| addr.ip());

        let forwarded_ip: Option<IpAddr> = if config.trust_forwarded_for {
            header_str(headers, "x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        } else {
            None
        };

        let network_address = forwarded_ip
            .or(peer_ip)
            .map(|ip| ip.to_string())
            .unwrap_or_default();

        Self {
            network_address,
            client_descriptor: header_str(headers, "user-agent")
                .unwrap_or_default()
                .to_string(),
            device_id: non_empty_header(headers, &config.device_id_header),
            location: non_empty_header(headers, &config.location_header),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn non_empty_header(headers: &HeaderMap, name: &str) -> Option<String> {
    header_str(headers, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Identity, request metadata and risk score of one request.
///
/// Attached to the request extensions once the gate admits the request.
/// The risk score is written exactly once, by the gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessContext {
    pub identity_id: String,
    pub network_address: String,
    pub client_descriptor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    risk_score: Option<f64>,
    pub permissions: BTreeSet<String>,
}

impl AccessContext {
    /// Build an unscored context for a verified identity.
    pub fn new(identity: &Identity, metadata: RequestMetadata) -> Self {
        Self {
            identity_id: identity.id.clone(),
            network_address: metadata.network_address,
            client_descriptor: metadata.client_descriptor,
            device_id: metadata.device_id,
            location: metadata.location,
            risk_score: None,
            permissions: identity.permissions.clone(),
        }
    }

    /// The computed risk score, once the gate has assessed the request.
    #[must_use]
    pub fn risk_score(&self) -> Option<f64> {
        self.risk_score
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Attach the assessed score, clamped into `[0, 100]`.
    #[must_use]
    pub(crate) fn with_risk_score(mut self, score: f64) -> Self {
        debug_assert!(self.risk_score.is_none(), "risk score recorded twice");
        self.risk_score = Some(score.clamp(0.0, 100.0));
        self
    }
}
