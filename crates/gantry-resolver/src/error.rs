//! The normalized gateway error.
//!
//! Every outward-facing failure reduces to a `{statusCode, reason}` pair; the
//! priority-ordered reason extraction lives here as pure logic so it is
//! implemented exactly once.

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

use gantry_registry::{InstanceError, RegistryError, TransientCause};

/// A result type using `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by the resolver and dispatcher.
///
/// Only [`GatewayError::Transport`] values whose cause is one of the five
/// recognized transient codes are ever recovered locally (by failover inside
/// the dispatcher); everything else propagates to the caller through the
/// `{statusCode, reason}` mapping.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Malformed resolver configuration at construction time. Fatal: the
    /// gateway refuses to start.
    #[error("invalid gateway configuration: {0}")]
    Configuration(String),

    /// The registry cannot supply any (further) instance for a realm.
    #[error("no instance available for realm: {realm}")]
    Selection {
        /// The realm that could not be served.
        realm: String,
    },

    /// A connection-level failure that was not recovered by failover.
    #[error("transport failure: {message}")]
    Transport {
        /// The recognized transient cause, if any.
        cause: Option<TransientCause>,
        /// Description of the underlying failure.
        message: String,
    },

    /// A downstream service answered with a non-2xx status. Propagated
    /// verbatim, never retried.
    #[error("upstream responded with status {status}")]
    Upstream {
        /// The downstream HTTP status, mirrored to the caller.
        status: StatusCode,
        /// The raw downstream body, mined for a reason string.
        body: Bytes,
    },

    /// The inbound body was declared `application/json` but failed to parse.
    #[error("malformed request body: {0}")]
    BodyDecoding(String),
}

impl GatewayError {
    /// The HTTP status to answer the caller with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Selection { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Transport { .. } => StatusCode::BAD_GATEWAY,
            Self::Upstream { status, .. } => *status,
            Self::BodyDecoding(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The reason string for the error envelope.
    ///
    /// For upstream failures the downstream body is inspected in priority
    /// order: an explicit `reason` field, a nested `error.reason`, a string
    /// `error` value, the raw body text, and finally this error's own
    /// message. The first present value wins.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Upstream { body, .. } => {
                extract_reason(body).unwrap_or_else(|| self.to_string())
            }
            other => other.to_string(),
        }
    }

    /// The transient transport cause, when this error carries one.
    #[must_use]
    pub const fn transient_cause(&self) -> Option<TransientCause> {
        match self {
            Self::Transport { cause, .. } => *cause,
            _ => None,
        }
    }
}

impl From<RegistryError> for GatewayError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NoInstance { realm } => Self::Selection { realm },
            RegistryError::Backend(message) => Self::Transport {
                cause: None,
                message,
            },
        }
    }
}

impl From<InstanceError> for GatewayError {
    fn from(err: InstanceError) -> Self {
        match err {
            InstanceError::Transport { cause, message } => Self::Transport { cause, message },
            InstanceError::Upstream { status, body } => Self::Upstream { status, body },
        }
    }
}

/// Mine a downstream body for a human-readable reason.
fn extract_reason(body: &Bytes) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(reason) = value.get("reason").and_then(serde_json::Value::as_str) {
            return Some(reason.to_owned());
        }
        if let Some(reason) = value
            .get("error")
            .and_then(|e| e.get("reason"))
            .and_then(serde_json::Value::as_str)
        {
            return Some(reason.to_owned());
        }
        if let Some(reason) = value.get("error").and_then(serde_json::Value::as_str) {
            return Some(reason.to_owned());
        }
    }

    if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(body).into_owned())
    }
}
