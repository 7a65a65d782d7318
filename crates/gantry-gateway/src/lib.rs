//! HTTP surface and entry point for the gantry gateway.
//!
//! This crate wires the identity resolver and the failover dispatcher behind
//! a single catch-all axum route: any method, any path of the form
//! `/{realm}/{rest...}`.
//!
//! # Request flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  any method, /{realm}/{rest}
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      gantry-gateway                         │
//! │  ┌──────────────┐  ┌───────────────┐  ┌─────────────────┐   │
//! │  │   Catch-all  │  │   Identity    │  │    Failover     │   │
//! │  │   handler    │─▶│   Resolver    │─▶│    Dispatcher   │   │
//! │  └──────────────┘  └───────────────┘  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!               │                │                 │
//!               ▼                ▼                 ▼
//!        ┌──────────┐     ┌──────────┐      ┌──────────┐
//!        │  authn   │     │  access  │      │ {realm}  │
//!        │  realm   │     │  realm   │      │ instance │
//!        └──────────┘     └──────────┘      └──────────┘
//! ```
//!
//! On success the downstream response is mirrored to the caller; on failure
//! the caller receives a `{"reason": ...}` JSON envelope with a best-effort
//! status code.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gantry_gateway::{create_router, GatewayConfig, GatewayState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_file("gateway.json")?;
//! let registry = Arc::new(config.build_registry());
//! let state = GatewayState::new(registry, config)?;
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod proxy;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
