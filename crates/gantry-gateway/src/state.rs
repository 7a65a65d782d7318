//! Gateway application state.

use std::sync::Arc;

use gantry_registry::Registry;
use gantry_resolver::{Dispatcher, GatewayError, IdentityResolver};

use crate::config::GatewayConfig;

/// Shared application state for the proxy handler.
pub struct GatewayState<R: Registry> {
    /// The two-stage identity resolver.
    pub resolver: IdentityResolver<R>,
    /// The failover dispatcher.
    pub dispatcher: Dispatcher<R>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<R: Registry> GatewayState<R> {
    /// Build the state from a registry and a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the resolver section is
    /// invalid; the gateway must not start in that case.
    pub fn new(registry: Arc<R>, config: GatewayConfig) -> Result<Self, GatewayError> {
        let resolver = IdentityResolver::new(Arc::clone(&registry), &config.resolver)?;
        let dispatcher = Dispatcher::new(registry, &config.resolver)?;

        Ok(Self {
            resolver,
            dispatcher,
            config,
        })
    }
}
