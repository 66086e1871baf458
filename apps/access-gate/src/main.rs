//! Access gate service.
//!
//! Verifies bearer tokens, scores each request's risk and forwards admitted
//! requests to the protected routes.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mietrecht_access_gate::{
    AccessRiskGate, CachedIdentityLookup, GateConfig, IdentityLookup, InMemoryIdentityLookup,
    SystemClock,
};
use tracing_subscriber::EnvFilter;

/// Upper bound on cached identity profiles.
const IDENTITY_CACHE_CAPACITY: u64 = 10_000;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = GateConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        listen_addr = %config.listen_addr,
        lookup_timeout_ms = config.lookup_timeout.as_millis() as u64,
        deny_above = config.policy.deny_above,
        warn_above = config.policy.warn_above,
        trust_forwarded_for = config.trust_forwarded_for,
        "starting access gate"
    );

    let store = match &config.identity_store_path {
        Some(path) => InMemoryIdentityLookup::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Identity store error: {e}");
            std::process::exit(1);
        }),
        None => {
            tracing::warn!("IDENTITY_STORE_PATH not set, every identity will be treated as unknown");
            InMemoryIdentityLookup::new()
        }
    };
    tracing::info!(identities = store.len(), "identity store loaded");

    let lookup: Arc<dyn IdentityLookup> = if config.identity_cache_ttl_secs > 0 {
        Arc::new(CachedIdentityLookup::new(
            store,
            Duration::from_secs(config.identity_cache_ttl_secs),
            IDENTITY_CACHE_CAPACITY,
        ))
    } else {
        Arc::new(store)
    };

    let listen_addr = config.listen_addr;
    let gate = AccessRiskGate::new(Arc::new(config), lookup, Arc::new(SystemClock));
    let app = routes::app(Arc::new(gate));

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to bind {listen_addr}: {e}");
            std::process::exit(1);
        });

    tracing::info!(%listen_addr, "access gate listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap_or_else(|e| {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    });
}

/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mietrecht_access_gate=debug"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
