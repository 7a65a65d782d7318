//! The transport-agnostic inbound request.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};

/// An inbound request as seen by the resolver and dispatcher.
///
/// The first path segment names the target realm; the remainder (plus any
/// query string) is the downstream path.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// The inbound HTTP method.
    pub method: Method,
    /// The inbound headers; lookup is case-insensitive.
    pub headers: HeaderMap,
    /// The full inbound path, including any query string.
    pub path: String,
    /// The raw inbound body; possibly empty.
    pub body: Bytes,
}

impl ProxyRequest {
    /// Assemble a request.
    pub fn new(method: Method, headers: HeaderMap, path: impl Into<String>, body: Bytes) -> Self {
        Self {
            method,
            headers,
            path: path.into(),
            body,
        }
    }

    /// The realm addressed by the request: the first path segment.
    #[must_use]
    pub fn realm(&self) -> &str {
        let path = self.path.split('?').next().unwrap_or("");
        path.trim_start_matches('/').split('/').next().unwrap_or("")
    }

    /// The downstream path: everything after the realm segment, reassembled
    /// with a leading separator, with the query string preserved.
    #[must_use]
    pub fn downstream_path(&self) -> String {
        let (path, query) = match self.path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.path.as_str(), None),
        };

        let rest = path
            .trim_start_matches('/')
            .split_once('/')
            .map_or("", |(_, rest)| rest);

        let mut downstream = format!("/{rest}");
        if let Some(query) = query {
            downstream.push('?');
            downstream.push_str(query);
        }
        downstream
    }

    /// The `content-type` header value, when present and valid text.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}
