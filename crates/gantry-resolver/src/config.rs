//! Resolver configuration.
//!
//! Configuration is injected by value at construction time; nothing in this
//! crate reads the environment.

use http::header::HeaderName;
use http::Method;
use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// Configuration for the two-stage identity resolver.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// The authentication stage. Mandatory.
    pub authentication: AuthenticationConfig,

    /// The access (authorization) stage. When absent the stage is a no-op
    /// passthrough.
    #[serde(default)]
    pub access: Option<AccessConfig>,
}

/// Where and how to exchange a credential token for an identity.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationConfig {
    /// Realm of the authentication service.
    pub realm: String,

    /// Path on the authentication service that resolves tokens.
    pub path: String,

    /// Header carrying the credential on input and the resolved identity on
    /// forwarded calls.
    #[serde(default = "AuthenticationConfig::default_header")]
    pub header: String,

    /// HTTP method for the authentication call.
    #[serde(default = "AuthenticationConfig::default_method")]
    pub method: String,
}

impl AuthenticationConfig {
    /// Create a config for the given realm and path with the default header
    /// (`authorization`) and method (`GET`).
    pub fn new(realm: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            path: path.into(),
            header: Self::default_header(),
            method: Self::default_method(),
        }
    }

    fn default_header() -> String {
        "authorization".to_owned()
    }

    fn default_method() -> String {
        "GET".to_owned()
    }
}

/// Where to check that a resolved identity may execute the request.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Realm of the authorization service.
    pub realm: String,
}

impl ResolverConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when a mandatory field is
    /// empty or the header name / method cannot be parsed. Called by the
    /// resolver and dispatcher constructors, so a bad configuration fails at
    /// startup rather than on the first request.
    pub fn validate(&self) -> Result<()> {
        if self.authentication.realm.is_empty() {
            return Err(GatewayError::Configuration(
                "authentication.realm must not be empty".to_owned(),
            ));
        }
        if self.authentication.path.is_empty() {
            return Err(GatewayError::Configuration(
                "authentication.path must not be empty".to_owned(),
            ));
        }
        if let Some(access) = &self.access {
            if access.realm.is_empty() {
                return Err(GatewayError::Configuration(
                    "access.realm must not be empty".to_owned(),
                ));
            }
        }

        self.header_name()?;
        self.auth_method()?;
        Ok(())
    }

    /// The identity header as a typed header name.
    pub(crate) fn header_name(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.authentication.header.as_bytes()).map_err(|_| {
            GatewayError::Configuration(format!(
                "invalid header name: {}",
                self.authentication.header
            ))
        })
    }

    /// The authentication call method as a typed method.
    pub(crate) fn auth_method(&self) -> Result<Method> {
        Method::from_bytes(self.authentication.method.as_bytes()).map_err(|_| {
            GatewayError::Configuration(format!(
                "invalid authentication method: {}",
                self.authentication.method
            ))
        })
    }
}
