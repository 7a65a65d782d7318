//! The catch-all proxy handler.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::Response;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};

use gantry_registry::{InstanceResponse, Registry};
use gantry_resolver::{GatewayError, ProxyRequest};

use crate::error::ApiError;
use crate::state::GatewayState;

/// Handle one inbound request: resolve identity, then dispatch with failover.
///
/// Accepts any method and any path; the first path segment selects the
/// target realm.
///
/// # Errors
///
/// All failures surface as an [`ApiError`], rendered as a `{"reason": ...}`
/// JSON envelope with a best-effort status code.
pub async fn proxy<R: Registry + 'static>(
    State(state): State<Arc<GatewayState<R>>>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());

    let body = to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|e| {
            GatewayError::BodyDecoding(format!("failed to read request body: {e}"))
        })?;

    let proxy_request = ProxyRequest::new(parts.method, parts.headers, path, body);

    tracing::debug!(
        method = %proxy_request.method,
        realm = proxy_request.realm(),
        path = %proxy_request.path,
        "proxying request"
    );

    let identity = state.resolver.resolve(&proxy_request).await?;
    let response = state
        .dispatcher
        .dispatch(&proxy_request, identity.as_ref())
        .await?;

    Ok(into_http_response(response))
}

/// Mirror a downstream response onto the outbound one.
///
/// Status and headers copy over verbatim, except the framing headers
/// (`content-length`, `transfer-encoding`), which the re-rendered body
/// recomputes.
fn into_http_response(response: InstanceResponse) -> Response {
    let InstanceResponse {
        status,
        mut headers,
        body,
    } = response;

    headers.remove(CONTENT_LENGTH);
    headers.remove(TRANSFER_ENCODING);

    let mut out = Response::new(Body::from(body.render()));
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};

    use gantry_registry::ResponseBody;

    #[test]
    fn framing_headers_are_recomputed() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("999"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));

        let response = into_http_response(InstanceResponse {
            status: StatusCode::CREATED,
            headers,
            body: ResponseBody::Raw(Bytes::from_static(b"ok")),
        });

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get("content-length").is_none());
        assert_eq!(
            response.headers().get("x-custom").unwrap(),
            &HeaderValue::from_static("kept")
        );
    }
}
