//! HTTP routes of the access gate service.

pub mod account;
pub mod health;

use std::sync::Arc;

use axum::Router;
use mietrecht_access_gate::{AccessRiskGate, RiskGateLayer};

/// Assemble the full router with the gate mounted in front of every route.
///
/// Public paths (see `PUBLIC_PATHS`) are skipped by the gate itself.
pub fn app(gate: Arc<AccessRiskGate>) -> Router {
    Router::new()
        .merge(health::health_routes())
        .merge(account::account_routes())
        .layer(RiskGateLayer::new(gate))
}
