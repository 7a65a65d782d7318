//! Router configuration.

use std::sync::Arc;

use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use gantry_registry::Registry;

use crate::proxy;
use crate::state::GatewayState;

/// Create the gateway router.
///
/// A single catch-all route accepts any method on any path of the form
/// `/{realm}/{rest...}` and proxies it through the resolver and dispatcher.
pub fn create_router<R: Registry + 'static>(state: GatewayState<R>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let state = Arc::new(state);

    Router::new()
        .fallback(proxy::proxy::<R>)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}
