//! Gateway configuration loading.
//!
//! Configuration lives in a JSON file. String values of the form `$NAME` are
//! substituted from the environment at load time; a missing variable is a
//! startup error, never a silent default. The parsed configuration is passed
//! by value into the core; nothing below this module reads the environment.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use gantry_registry::{HttpInstance, StaticRegistry};
use gantry_resolver::{GatewayError, ResolverConfig};

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Maximum inbound request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// The identity resolver configuration.
    pub resolver: ResolverConfig,

    /// Static realm → instance base URL map used to bootstrap discovery.
    #[serde(default)]
    pub realms: HashMap<String, Vec<String>>,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_owned()
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the file cannot be read
    /// or parsed, a `$NAME` substitution names a missing environment
    /// variable, or the resolver section is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;

        let value = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::Configuration(format!("cannot parse {}: {e}", path.display()))
        })?;

        Self::from_value(value)
    }

    /// Build a configuration from an already-parsed JSON value, applying
    /// environment substitution.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GatewayConfig::from_file`], minus the I/O.
    pub fn from_value(mut value: serde_json::Value) -> Result<Self, GatewayError> {
        substitute_env(&mut value)?;

        let config: Self = serde_json::from_value(value)
            .map_err(|e| GatewayError::Configuration(format!("invalid configuration: {e}")))?;

        config.resolver.validate()?;
        Ok(config)
    }

    /// Build the static registry from the configured realm map.
    ///
    /// Instance ids are the base URLs themselves, so the same endpoint listed
    /// under two realms shares one exclusion identity.
    #[must_use]
    pub fn build_registry(&self) -> StaticRegistry {
        let mut registry = StaticRegistry::new();
        for (realm, urls) in &self.realms {
            for url in urls {
                registry.register(realm.clone(), Arc::new(HttpInstance::new(url.clone(), url.clone())));
            }
        }
        registry
    }
}

/// Recursively replace `$NAME` string values from the environment.
fn substitute_env(value: &mut serde_json::Value) -> Result<(), GatewayError> {
    match value {
        serde_json::Value::String(s) if s.starts_with('$') => {
            let name = &s[1..];
            let substituted = std::env::var(name).map_err(|_| {
                GatewayError::Configuration(format!("missing environment variable: {name}"))
            })?;
            *s = substituted;
        }
        serde_json::Value::Object(map) => {
            for entry in map.values_mut() {
                substitute_env(entry)?;
            }
        }
        serde_json::Value::Array(entries) => {
            for entry in entries {
                substitute_env(entry)?;
            }
        }
        _ => {}
    }
    Ok(())
}
