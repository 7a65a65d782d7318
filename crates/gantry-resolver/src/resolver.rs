//! The two-stage identity resolver.
//!
//! Authentication exchanges the inbound credential token for an opaque
//! identity value; the optional access stage then gates progress without ever
//! touching that value.

use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::Method;

use gantry_registry::{Instance, InstanceQuery, Registry, RequestOptions, ResponseBody};

use crate::config::ResolverConfig;
use crate::error::{GatewayError, Result};
use crate::request::ProxyRequest;

/// The opaque identity produced by authentication.
///
/// Carried as-is through authorization and dispatch; nothing downstream of
/// the authentication stage may interpret or mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    /// Wrap an identity value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the inner value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves authentication, then authorization, into a single identity value.
pub struct IdentityResolver<R: Registry> {
    registry: Arc<R>,
    header: HeaderName,
    method: Method,
    auth_realm: String,
    auth_path: String,
    access_realm: Option<String>,
}

impl<R: Registry> IdentityResolver<R> {
    /// Create a resolver over the given registry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] when the configuration is
    /// invalid; the gateway must not start in that case.
    pub fn new(registry: Arc<R>, config: &ResolverConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            registry,
            header: config.header_name()?,
            method: config.auth_method()?,
            auth_realm: config.authentication.realm.clone(),
            auth_path: config.authentication.path.clone(),
            access_realm: config.access.as_ref().map(|a| a.realm.clone()),
        })
    }

    /// The configured identity header name.
    #[must_use]
    pub const fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Exchange the inbound credential token for an identity.
    ///
    /// When the configured header is absent this resolves to `None`
    /// immediately, with zero side effects: the registry is never contacted.
    /// Otherwise the token is forwarded unchanged to the configured path on
    /// one instance of the authentication realm, and the response body is
    /// normalized into the identity value. No retry happens at this stage.
    ///
    /// # Errors
    ///
    /// Selection and downstream failures propagate unchanged.
    pub async fn resolve_authentication(&self, request: &ProxyRequest) -> Result<Option<Identity>> {
        let Some(token) = request.headers.get(&self.header) else {
            return Ok(None);
        };
        let token = token.clone();

        let instance = self
            .registry
            .next(&InstanceQuery::new(self.auth_realm.clone()))
            .await?;

        let mut options = RequestOptions::new(self.method.clone());
        options.headers.insert(self.header.clone(), token);

        let response = instance.request(&self.auth_path, options).await?;

        let identity = normalize_identity(response.body);
        tracing::debug!(realm = %self.auth_realm, "authentication resolved");
        Ok(Some(identity))
    }

    /// Check that the identity may execute the request.
    ///
    /// A passthrough when no access realm is configured. Otherwise one
    /// instance of the access realm receives the original request's method
    /// and full path with the identity in the configured header; its response
    /// body is discarded. The access service's only observable effect is
    /// accept or reject.
    ///
    /// # Errors
    ///
    /// Selection and downstream failures propagate unchanged.
    pub async fn resolve_access(
        &self,
        request: &ProxyRequest,
        identity: Option<Identity>,
    ) -> Result<Option<Identity>> {
        let Some(realm) = &self.access_realm else {
            return Ok(identity);
        };

        let instance = self
            .registry
            .next(&InstanceQuery::new(realm.clone()))
            .await?;

        let mut options = RequestOptions::new(request.method.clone());
        options
            .headers
            .insert(self.header.clone(), identity_header_value(identity.as_ref())?);

        instance.request(&request.path, options).await?;

        tracing::debug!(realm = %realm, "access granted");
        Ok(identity)
    }

    /// The strict two-stage pipeline: authentication, then access.
    ///
    /// # Errors
    ///
    /// Fails if either stage fails; access never runs before authentication
    /// resolves.
    pub async fn resolve(&self, request: &ProxyRequest) -> Result<Option<Identity>> {
        let identity = self.resolve_authentication(request).await?;
        self.resolve_access(request, identity).await
    }
}

/// Normalize a downstream response body into the identity value.
///
/// Structured JSON serializes to its canonical string form; raw bytes fall
/// back to their text (permissive, not an error).
fn normalize_identity(body: ResponseBody) -> Identity {
    match body {
        ResponseBody::Json(value) => Identity::new(
            serde_json::to_string(&value).unwrap_or_else(|_| value.to_string()),
        ),
        ResponseBody::Raw(bytes) => Identity::new(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// The identity header value for a forwarded call.
///
/// An absent identity forwards the header with an empty value; the downstream
/// service, not the gateway, decides whether to reject.
pub(crate) fn identity_header_value(identity: Option<&Identity>) -> Result<HeaderValue> {
    match identity {
        None => Ok(HeaderValue::from_static("")),
        Some(identity) => HeaderValue::from_str(identity.as_str()).map_err(|_| {
            GatewayError::Transport {
                cause: None,
                message: "resolved identity is not a valid header value".to_owned(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    use gantry_registry::{InstanceError, InstanceResponse, MockInstance, MockRegistry};

    use crate::config::{AccessConfig, AuthenticationConfig};

    fn config() -> ResolverConfig {
        ResolverConfig {
            authentication: AuthenticationConfig::new("auth", "/tokens/resolve"),
            access: None,
        }
    }

    fn config_with_access() -> ResolverConfig {
        ResolverConfig {
            authentication: AuthenticationConfig::new("auth", "/tokens/resolve"),
            access: Some(AccessConfig {
                realm: "acl".to_owned(),
            }),
        }
    }

    fn request_with_token(token: &'static str) -> ProxyRequest {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static(token));
        ProxyRequest::new(Method::GET, headers, "/orders/123", Bytes::new())
    }

    fn raw_response(body: &'static [u8]) -> InstanceResponse {
        InstanceResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Raw(Bytes::from_static(body)),
        }
    }

    #[tokio::test]
    async fn missing_header_resolves_absent_without_registry_call() {
        let registry = Arc::new(MockRegistry::new());
        registry.register("auth", Arc::new(MockInstance::new("auth-1")));
        let resolver = IdentityResolver::new(Arc::clone(&registry), &config()).unwrap();

        let request = ProxyRequest::new(Method::GET, HeaderMap::new(), "/orders/1", Bytes::new());
        let identity = resolver.resolve_authentication(&request).await.unwrap();

        assert_eq!(identity, None);
        assert_eq!(registry.query_count(), 0);
    }

    #[tokio::test]
    async fn token_is_forwarded_unchanged_to_the_configured_endpoint() {
        let registry = Arc::new(MockRegistry::new());
        let auth = Arc::new(MockInstance::new("auth-1"));
        auth.enqueue_ok(raw_response(b"user-42"));
        registry.register("auth", Arc::clone(&auth));

        let mut cfg = config();
        cfg.authentication.method = "POST".to_owned();
        let resolver = IdentityResolver::new(Arc::clone(&registry), &cfg).unwrap();

        let identity = resolver
            .resolve_authentication(&request_with_token("tok1"))
            .await
            .unwrap();

        assert_eq!(identity, Some(Identity::new("user-42")));

        let calls = auth.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/tokens/resolve");
        assert_eq!(calls[0].options.method, Method::POST);
        assert_eq!(
            calls[0].options.headers.get("authorization").unwrap(),
            &HeaderValue::from_static("tok1")
        );
    }

    #[tokio::test]
    async fn structured_identity_serializes_canonically() {
        let registry = Arc::new(MockRegistry::new());
        let auth = Arc::new(MockInstance::new("auth-1"));
        auth.enqueue_ok(InstanceResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Json(serde_json::json!({"user": "42"})),
        });
        registry.register("auth", auth);

        let resolver = IdentityResolver::new(registry, &config()).unwrap();
        let identity = resolver
            .resolve_authentication(&request_with_token("tok1"))
            .await
            .unwrap();

        assert_eq!(identity, Some(Identity::new("{\"user\":\"42\"}")));
    }

    #[tokio::test]
    async fn authentication_failure_propagates_without_retry() {
        let registry = Arc::new(MockRegistry::new());
        let auth = Arc::new(MockInstance::new("auth-1"));
        auth.enqueue_err(InstanceError::transport(None, "boom"));
        registry.register("auth", Arc::clone(&auth));

        let resolver = IdentityResolver::new(Arc::clone(&registry), &config()).unwrap();
        let err = resolver
            .resolve_authentication(&request_with_token("tok1"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Transport { .. }));
        assert_eq!(auth.call_count(), 1);
        assert_eq!(registry.query_count(), 1);
    }

    #[tokio::test]
    async fn access_is_a_passthrough_when_unconfigured() {
        let registry = Arc::new(MockRegistry::new());
        let resolver = IdentityResolver::new(Arc::clone(&registry), &config()).unwrap();

        let identity = Some(Identity::new("user-42"));
        let resolved = resolver
            .resolve_access(&request_with_token("tok1"), identity.clone())
            .await
            .unwrap();

        assert_eq!(resolved, identity);
        assert_eq!(registry.query_count(), 0);
    }

    #[tokio::test]
    async fn access_gates_without_mutating_the_identity() {
        let registry = Arc::new(MockRegistry::new());
        let acl = Arc::new(MockInstance::new("acl-1"));
        acl.enqueue_ok(raw_response(b"{\"membership\":\"gold\"}"));
        registry.register("acl", Arc::clone(&acl));

        let resolver = IdentityResolver::new(registry, &config_with_access()).unwrap();
        let identity = Some(Identity::new("user-42"));
        let resolved = resolver
            .resolve_access(&request_with_token("tok1"), identity.clone())
            .await
            .unwrap();

        // The response payload is not part of the contract.
        assert_eq!(resolved, identity);

        let calls = acl.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/orders/123");
        assert_eq!(calls[0].options.method, Method::GET);
        assert_eq!(
            calls[0].options.headers.get("authorization").unwrap(),
            &HeaderValue::from_static("user-42")
        );
    }

    #[tokio::test]
    async fn access_rejection_propagates() {
        let registry = Arc::new(MockRegistry::new());
        let acl = Arc::new(MockInstance::new("acl-1"));
        acl.enqueue_err(InstanceError::Upstream {
            status: StatusCode::FORBIDDEN,
            body: Bytes::from_static(b"{\"reason\":\"not a member\"}"),
        });
        registry.register("acl", acl);

        let resolver = IdentityResolver::new(registry, &config_with_access()).unwrap();
        let err = resolver
            .resolve_access(&request_with_token("tok1"), Some(Identity::new("user-42")))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.reason(), "not a member");
    }

    #[tokio::test]
    async fn resolve_runs_authentication_before_access() {
        let registry = Arc::new(MockRegistry::new());
        let auth = Arc::new(MockInstance::new("auth-1"));
        auth.enqueue_ok(raw_response(b"user-42"));
        let acl = Arc::new(MockInstance::new("acl-1"));
        registry.register("auth", Arc::clone(&auth));
        registry.register("acl", Arc::clone(&acl));

        let resolver = IdentityResolver::new(Arc::clone(&registry), &config_with_access()).unwrap();
        let identity = resolver
            .resolve(&request_with_token("tok1"))
            .await
            .unwrap();

        assert_eq!(identity, Some(Identity::new("user-42")));

        let queries = registry.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].realm, "auth");
        assert_eq!(queries[1].realm, "acl");

        // The access call carried the freshly resolved identity.
        assert_eq!(
            acl.calls()[0].options.headers.get("authorization").unwrap(),
            &HeaderValue::from_static("user-42")
        );
    }

    #[tokio::test]
    async fn absent_identity_reaches_access_as_empty_header() {
        let registry = Arc::new(MockRegistry::new());
        let acl = Arc::new(MockInstance::new("acl-1"));
        registry.register("acl", Arc::clone(&acl));

        let resolver = IdentityResolver::new(registry, &config_with_access()).unwrap();
        let request = ProxyRequest::new(Method::GET, HeaderMap::new(), "/orders/1", Bytes::new());
        let resolved = resolver.resolve(&request).await.unwrap();

        assert_eq!(resolved, None);
        assert_eq!(
            acl.calls()[0].options.headers.get("authorization").unwrap(),
            &HeaderValue::from_static("")
        );
    }

    #[test]
    fn invalid_configuration_fails_construction() {
        let registry = Arc::new(MockRegistry::new());
        let config = ResolverConfig {
            authentication: AuthenticationConfig::new("", "/resolve"),
            access: None,
        };
        assert!(matches!(
            IdentityResolver::new(registry, &config),
            Err(GatewayError::Configuration(_))
        ));
    }
}
