//! Routes behind the gate.

use axum::{middleware, routing::get, Extension, Json, Router};
use mietrecht_access_gate::{require_permission, AccessContext, RiskLevel};
use serde::Serialize;

/// Permission required for the audit view.
pub const ADMIN_PERMISSION: &str = "admin";

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub context: AccessContext,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub reviewed_by: String,
    pub risk_score: Option<f64>,
}

pub fn account_routes() -> Router {
    Router::new().route("/api/me", get(me)).route(
        "/api/admin/audit",
        get(audit).layer(middleware::from_fn_with_state(
            ADMIN_PERMISSION,
            require_permission,
        )),
    )
}

/// Echo the access context the gate attached to this request.
async fn me(
    Extension(context): Extension<AccessContext>,
    Extension(risk_level): Extension<RiskLevel>,
) -> Json<MeResponse> {
    Json(MeResponse {
        context,
        risk_level,
    })
}

async fn audit(Extension(context): Extension<AccessContext>) -> Json<AuditResponse> {
    tracing::info!(identity_id = %context.identity_id, "audit view opened");
    Json(AuditResponse {
        risk_score: context.risk_score(),
        reviewed_by: context.identity_id,
    })
}
