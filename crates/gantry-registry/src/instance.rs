//! The downstream instance contract.
//!
//! An [`Instance`] represents one concrete downstream endpoint. The gateway
//! core only ever holds an instance transiently, for the duration of a single
//! call attempt.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::error::InstanceError;

/// Opaque identifier for one downstream instance.
///
/// Identifiers are what the per-request exclusion set tracks; two handles to
/// the same endpoint must share the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(String);

impl InstanceId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A request body after content-type transcoding, ready to send downstream.
#[derive(Debug, Clone)]
pub enum OutboundBody {
    /// Structured JSON, re-serialized on the wire.
    Json(serde_json::Value),
    /// Decoded text.
    Text(String),
    /// Raw bytes, passed through unmodified.
    Raw(Bytes),
}

impl OutboundBody {
    /// Serialize the body to wire bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Json(value) => {
                serde_json::to_vec(&value)
                    .expect("serializing a JSON value cannot fail")
                    .into()
            }
            Self::Text(text) => text.into_bytes().into(),
            Self::Raw(bytes) => bytes,
        }
    }
}

/// Options for a single downstream call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method for the call.
    pub method: Method,
    /// Headers to send; already stripped of `content-length`.
    pub headers: HeaderMap,
    /// Body, if the inbound request carried one.
    pub body: Option<OutboundBody>,
}

impl RequestOptions {
    /// Create options for the given method with no headers and no body.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A downstream response body: raw bytes for faithful mirroring, or a
/// structured value for instances that decode in-process.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// Raw response bytes, mirrored verbatim.
    Raw(Bytes),
    /// A decoded JSON value.
    Json(serde_json::Value),
}

impl ResponseBody {
    /// Render the body to outbound bytes.
    ///
    /// A JSON number renders as its decimal string form; any other JSON value
    /// serializes canonically; raw bytes pass through untouched.
    #[must_use]
    pub fn render(self) -> Bytes {
        match self {
            Self::Raw(bytes) => bytes,
            Self::Json(serde_json::Value::Number(n)) => n.to_string().into_bytes().into(),
            Self::Json(value) => {
                serde_json::to_vec(&value)
                    .expect("serializing a JSON value cannot fail")
                    .into()
            }
        }
    }
}

/// A full downstream response: status, headers, and body all observable.
#[derive(Debug, Clone)]
pub struct InstanceResponse {
    /// The downstream HTTP status.
    pub status: StatusCode,
    /// The downstream response headers.
    pub headers: HeaderMap,
    /// The downstream response body.
    pub body: ResponseBody,
}

impl InstanceResponse {
    /// A `200 OK` response with no headers and an empty raw body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Raw(Bytes::new()),
        }
    }
}

/// One concrete downstream endpoint.
///
/// Implementations must be safe for concurrent use: many in-flight gateway
/// requests may call the same instance at once.
#[async_trait]
pub trait Instance: Send + Sync {
    /// The identifier tracked by exclusion sets.
    fn id(&self) -> &InstanceId;

    /// Perform one HTTP call against this instance.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::Transport`] for connection-level failures
    /// (carrying a transient cause code when one applies) and
    /// [`InstanceError::Upstream`] when the instance answers with a non-2xx
    /// status.
    async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<InstanceResponse, InstanceError>;
}

impl std::fmt::Debug for dyn Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(self.id()).finish()
    }
}
