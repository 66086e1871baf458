//! Tower middleware mounting the gate in front of protected routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::context::AccessContext;
use crate::error::GateError;
use crate::gate::AccessRiskGate;

/// Layer for the access risk gate.
#[derive(Clone)]
pub struct RiskGateLayer {
    gate: Arc<AccessRiskGate>,
}

impl RiskGateLayer {
    /// Create a new layer around a shared gate.
    pub fn new(gate: Arc<AccessRiskGate>) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for RiskGateLayer {
    type Service = RiskGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RiskGateService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Service wrapper produced by [`RiskGateLayer`].
#[derive(Clone)]
pub struct RiskGateService<S> {
    inner: S,
    gate: Arc<AccessRiskGate>,
}

impl<S> Service<Request<Body>> for RiskGateService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let gate = self.gate.clone();
        // Use the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if gate.config().is_public_path(request.uri().path()) {
                return inner.call(request).await;
            }

            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0);

            match gate.gate(request.headers(), peer).await {
                Ok(admission) => {
                    request.extensions_mut().insert(admission.context);
                    request.extensions_mut().insert(admission.level);
                    inner.call(request).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

/// Route guard requiring a permission on the attached access context.
///
/// # Usage
///
/// ```rust,ignore
/// use axum::{middleware, routing::get, Router};
/// use mietrecht_access_gate::middleware::require_permission;
///
/// let admin = Router::new()
///     .route("/admin/audit", get(audit_log))
///     .layer(middleware::from_fn_with_state("admin", require_permission));
/// ```
///
/// # Errors
///
/// - 401 `Unauthorized`: no access context (gate not mounted in front)
/// - 403 `AccessDenied`: permission not granted
pub async fn require_permission(
    State(permission): State<&'static str>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    let context = request
        .extensions()
        .get::<AccessContext>()
        .ok_or_else(|| GateError::Unexpected("access context missing".into()))?;

    if !context.has_permission(permission) {
        tracing::warn!(
            identity_id = %context.identity_id,
            required = permission,
            "permission denied"
        );
        return Err(GateError::PermissionDenied(permission.to_string()));
    }

    Ok(next.run(request).await)
}
