//! Gantry Gateway - realm-routing API gateway.
//!
//! Resolves the caller's identity through a configured authentication realm,
//! optionally checks access, and proxies the request to an instance of the
//! realm named by the first path segment, failing over on transient
//! transport errors.
//!
//! Configuration is a JSON file; pass its path via the `GANTRY_CONFIG`
//! environment variable (default: `gateway.json`). String values of the form
//! `$NAME` are substituted from the environment at startup.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gantry_gateway::{create_router, GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gantry=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gantry Gateway");

    let config_path = std::env::var("GANTRY_CONFIG").unwrap_or_else(|_| "gateway.json".into());
    let config = GatewayConfig::from_file(&config_path)?;

    tracing::info!(
        config_path = %config_path,
        listen_addr = %config.listen_addr,
        auth_realm = %config.resolver.authentication.realm,
        access_realm = ?config.resolver.access.as_ref().map(|a| &a.realm),
        realms = config.realms.len(),
        "Gateway configuration loaded"
    );

    let registry = Arc::new(config.build_registry());
    for (realm, urls) in &config.realms {
        tracing::info!(realm = %realm, instances = urls.len(), "Realm registered");
    }

    let listen_addr = config.listen_addr.clone();
    let state = GatewayState::new(registry, config)?;
    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
