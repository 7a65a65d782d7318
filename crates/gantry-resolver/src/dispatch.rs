//! The failover-aware dispatcher.
//!
//! Per top-level request the dispatcher runs an explicit select/attempt loop.
//! The exclusion set grows strictly across retries, so termination is
//! guaranteed by registry exhaustion even though no retry cap exists.

use std::sync::Arc;

use http::header::{HeaderName, CONTENT_LENGTH};

use gantry_registry::{
    ExclusionSet, Instance, InstanceQuery, InstanceResponse, Registry, RequestOptions,
};

use crate::config::ResolverConfig;
use crate::encoding::BodyEncoding;
use crate::error::Result;
use crate::request::ProxyRequest;
use crate::resolver::{identity_header_value, Identity};

/// Forwards requests to realm instances, retrying transient transport
/// failures against instances not yet tried.
pub struct Dispatcher<R: Registry> {
    registry: Arc<R>,
    header: HeaderName,
}

impl<R: Registry> Dispatcher<R> {
    /// Create a dispatcher over the given registry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::Configuration`] when the configured
    /// identity header is not a valid header name.
    pub fn new(registry: Arc<R>, config: &ResolverConfig) -> Result<Self> {
        Ok(Self {
            registry,
            header: config.header_name()?,
        })
    }

    /// Forward the request to an instance of its realm.
    ///
    /// The realm is the first path segment; the rest of the path (and query)
    /// goes downstream. The outbound call copies the inbound method and
    /// headers, drops `content-length` (the body is re-encoded, so its length
    /// may change), overwrites the identity header, and transcodes the body
    /// per its declared content type.
    ///
    /// A failure whose transport cause is one of the five recognized
    /// transient codes selects another instance, excluding everything tried
    /// so far. Retries are unbounded by count; the registry running out of
    /// untried instances surfaces as a selection failure. Any other error
    /// propagates immediately.
    ///
    /// # Errors
    ///
    /// See [`crate::GatewayError`] for the failure taxonomy.
    pub async fn dispatch(
        &self,
        request: &ProxyRequest,
        identity: Option<&Identity>,
    ) -> Result<InstanceResponse> {
        let realm = request.realm().to_owned();
        let downstream_path = request.downstream_path();

        // Transcoding is deterministic, so it happens once, not per attempt.
        let body = if request.body.is_empty() {
            None
        } else {
            let encoding = BodyEncoding::from_content_type(request.content_type());
            Some(encoding.transcode(&request.body)?)
        };

        let mut headers = request.headers.clone();
        headers.remove(CONTENT_LENGTH);
        headers.insert(self.header.clone(), identity_header_value(identity)?);

        let mut tried = ExclusionSet::new();

        loop {
            let query = InstanceQuery::new(realm.clone()).excluding(tried.clone());
            let instance = self.registry.next(&query).await?;

            // Counted as tried before the call, so a crash mid-flight still
            // excludes the instance.
            tried.insert(instance.id().clone());

            let options = RequestOptions {
                method: request.method.clone(),
                headers: headers.clone(),
                body: body.clone(),
            };

            match instance.request(&downstream_path, options).await {
                Ok(response) => {
                    tracing::debug!(
                        realm = %realm,
                        instance = %instance.id(),
                        status = %response.status,
                        attempts = tried.len(),
                        "request dispatched"
                    );
                    return Ok(response);
                }
                Err(err) => {
                    let Some(cause) = err.transient_cause() else {
                        return Err(err.into());
                    };
                    tracing::warn!(
                        realm = %realm,
                        instance = %instance.id(),
                        code = %cause,
                        tried = tried.len(),
                        "transient transport failure, failing over"
                    );
                }
            }
        }
    }
}
