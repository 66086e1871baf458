//! Risk-based access gate for the Mietrecht HTTP services.
//!
//! Every protected request passes through [`AccessRiskGate`]:
//!
//! 1. the bearer credential is verified and turned into an [`Identity`]
//! 2. an [`AccessContext`] is built from the identity and request metadata
//! 3. the [`RiskEngine`] scores the context from user behavior and time of day
//! 4. the score is compared to the policy thresholds: deny above 80, allow
//!    with a warning above 50, otherwise allow silently
//!
//! Admitted requests carry the scored [`AccessContext`] in their extensions
//! for downstream authorization ([`middleware::require_permission`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{routing::get, Router};
//! use mietrecht_access_gate::{AccessRiskGate, GateConfig, InMemoryIdentityLookup, RiskGateLayer, SystemClock};
//!
//! let config = Arc::new(GateConfig::from_env()?);
//! let gate = AccessRiskGate::new(config, Arc::new(InMemoryIdentityLookup::new()), Arc::new(SystemClock));
//!
//! let app = Router::new()
//!     .route("/api/me", get(me))
//!     .layer(RiskGateLayer::new(Arc::new(gate)));
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod lookup;
pub mod middleware;
pub mod risk;

pub use clock::{Clock, ClockError, FixedClock, SystemClock};
pub use config::{ConfigError, GateConfig, RiskFactor, RiskPolicy, TimeBand};
pub use context::{AccessContext, Identity, RequestMetadata};
pub use error::{ErrorResponse, GateError};
pub use gate::{AccessRiskGate, Admission};
pub use lookup::{
    CachedIdentityLookup, IdentityLookup, IdentityProfile, InMemoryIdentityLookup, LookupError,
};
pub use middleware::{require_permission, RiskGateLayer, RiskGateService};
pub use risk::{RiskEngine, RiskLevel};
