//! Reqwest-backed downstream transport.
//!
//! This module provides [`HttpInstance`], the production [`Instance`]
//! implementation. Connection-level failures are mapped onto the recognized
//! transient cause codes so the dispatcher can decide whether to fail over.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{InstanceError, TransientCause};
use crate::instance::{Instance, InstanceId, InstanceResponse, RequestOptions, ResponseBody};

/// One HTTP downstream endpoint.
#[derive(Debug, Clone)]
pub struct HttpInstance {
    id: InstanceId,
    base_url: String,
    client: reqwest::Client,
}

impl HttpInstance {
    /// Create an instance for the given base URL (e.g. `http://10.0.0.1:3000`).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen with
    /// default TLS).
    #[must_use]
    pub fn new(id: impl Into<InstanceId>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to create HTTP client");

        Self::with_client(client, id, base_url)
    }

    /// Create an instance with a custom reqwest client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        id: impl Into<InstanceId>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            client,
        }
    }

    /// The base URL this instance points at.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Instance for HttpInstance {
    fn id(&self) -> &InstanceId {
        &self.id
    }

    async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<InstanceResponse, InstanceError> {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .client
            .request(options.method, &url)
            .headers(options.headers);

        if let Some(body) = options.body {
            builder = builder.body(body.into_bytes());
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_transport_error)?;

        if status.is_success() {
            Ok(InstanceResponse {
                status,
                headers,
                body: ResponseBody::Raw(body),
            })
        } else {
            Err(InstanceError::Upstream { status, body })
        }
    }
}

/// Convert a reqwest error into a transport error, extracting a transient
/// cause when the underlying failure carries one.
fn map_transport_error(err: reqwest::Error) -> InstanceError {
    let cause = transient_cause_of(&err);
    if let Some(cause) = cause {
        tracing::debug!(code = %cause, error = %err, "transient transport failure");
    }
    InstanceError::transport(cause, err.to_string())
}

/// Walk the error source chain looking for a connection-level I/O failure.
fn transient_cause_of(err: &reqwest::Error) -> Option<TransientCause> {
    if err.is_timeout() {
        return Some(TransientCause::TimedOut);
    }

    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if let Some(cause) = TransientCause::from_io_kind(io.kind()) {
                return Some(cause);
            }
        }
        source = inner.source();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderValue, Method, StatusCode};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::instance::OutboundBody;

    #[tokio::test]
    async fn successful_call_returns_full_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "tok1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-served-by", "mock")
                    .set_body_bytes(b"pong".to_vec()),
            )
            .mount(&server)
            .await;

        let instance = HttpInstance::new("mock-1", server.uri());
        let mut options = RequestOptions::new(Method::GET);
        options
            .headers
            .insert("authorization", HeaderValue::from_static("tok1"));

        let response = instance.request("/ping", options).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers.get("x-served-by").unwrap(),
            &HeaderValue::from_static("mock")
        );
        assert!(matches!(
            response.body,
            ResponseBody::Raw(ref bytes) if bytes == &Bytes::from_static(b"pong")
        ));
    }

    #[tokio::test]
    async fn body_is_forwarded_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(body_string("{\"name\":\"widget\"}"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let instance = HttpInstance::new("mock-1", server.uri());
        let mut options = RequestOptions::new(Method::POST);
        options.body = Some(OutboundBody::Json(serde_json::json!({"name": "widget"})));

        let response = instance.request("/items", options).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn non_success_status_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(
                ResponseTemplate::new(403).set_body_bytes(b"{\"reason\":\"forbidden\"}".to_vec()),
            )
            .mount(&server)
            .await;

        let instance = HttpInstance::new("mock-1", server.uri());
        let err = instance
            .request("/denied", RequestOptions::new(Method::GET))
            .await
            .unwrap_err();

        match err {
            InstanceError::Upstream { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, Bytes::from_static(b"{\"reason\":\"forbidden\"}"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert!(matches!(
            instance
                .request("/denied", RequestOptions::new(Method::GET))
                .await
                .unwrap_err()
                .transient_cause(),
            None
        ));
    }

    #[tokio::test]
    async fn connection_refused_maps_to_transient_cause() {
        // Bind and immediately drop a listener to get a port nothing accepts on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let instance = HttpInstance::new("dead-1", format!("http://{addr}"));
        let err = instance
            .request("/anything", RequestOptions::new(Method::GET))
            .await
            .unwrap_err();

        assert_eq!(
            err.transient_cause(),
            Some(TransientCause::ConnectionRefused)
        );
    }
}
