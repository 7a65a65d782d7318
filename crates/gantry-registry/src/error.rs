//! Discovery and transport error types.

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

/// Connection-level failure causes that are considered retriable against a
/// different instance of the same realm.
///
/// The wire codes mirror the POSIX error names exposed by the transport:
/// `ECONNREFUSED`, `ESOCKETTIMEDOUT`, `ECONNRESET`, `ETIMEDOUT`, `EPIPE`.
/// Any failure outside this set is treated as terminal for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientCause {
    /// The instance actively refused the connection.
    ConnectionRefused,
    /// The socket timed out while reading the response.
    SocketTimeout,
    /// The connection was reset by the peer.
    ConnectionReset,
    /// The connection attempt timed out.
    TimedOut,
    /// The peer closed the connection mid-write.
    BrokenPipe,
}

impl TransientCause {
    /// The machine-readable wire code for this cause.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConnectionRefused => "ECONNREFUSED",
            Self::SocketTimeout => "ESOCKETTIMEDOUT",
            Self::ConnectionReset => "ECONNRESET",
            Self::TimedOut => "ETIMEDOUT",
            Self::BrokenPipe => "EPIPE",
        }
    }

    /// Parse a wire code back into a cause.
    ///
    /// Returns `None` for codes outside the recognized set.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ECONNREFUSED" => Some(Self::ConnectionRefused),
            "ESOCKETTIMEDOUT" => Some(Self::SocketTimeout),
            "ECONNRESET" => Some(Self::ConnectionReset),
            "ETIMEDOUT" => Some(Self::TimedOut),
            "EPIPE" => Some(Self::BrokenPipe),
            _ => None,
        }
    }

    /// Map an I/O error kind onto a transient cause, if it is one of the
    /// recognized connection-level failures.
    #[must_use]
    pub const fn from_io_kind(kind: std::io::ErrorKind) -> Option<Self> {
        match kind {
            std::io::ErrorKind::ConnectionRefused => Some(Self::ConnectionRefused),
            std::io::ErrorKind::ConnectionReset => Some(Self::ConnectionReset),
            std::io::ErrorKind::TimedOut => Some(Self::TimedOut),
            std::io::ErrorKind::BrokenPipe => Some(Self::BrokenPipe),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransientCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur while selecting an instance from a registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No instance matches the query: the realm is unknown, empty, or every
    /// candidate has already been excluded.
    #[error("no instance available for realm: {realm}")]
    NoInstance {
        /// The realm the selection was attempted for.
        realm: String,
    },

    /// The registry backend itself failed to answer.
    #[error("registry backend failure: {0}")]
    Backend(String),
}

/// Errors that can occur while calling one downstream instance.
#[derive(Debug, Clone, Error)]
pub enum InstanceError {
    /// The call failed at the connection level, before or while a response
    /// was being read. Retriable only when `cause` is recognized.
    #[error("transport failure: {message}")]
    Transport {
        /// The recognized transient cause, if the failure maps onto one.
        cause: Option<TransientCause>,
        /// Human-readable description of the underlying failure.
        message: String,
    },

    /// The instance answered with a non-2xx status. Never retried; the
    /// status and body are propagated to the caller.
    #[error("upstream responded with status {status}")]
    Upstream {
        /// The downstream HTTP status.
        status: StatusCode,
        /// The raw downstream response body.
        body: Bytes,
    },
}

impl InstanceError {
    /// The transient cause attached to this error, if any.
    ///
    /// A `Some` return value means the dispatcher may retry the request
    /// against another instance.
    #[must_use]
    pub const fn transient_cause(&self) -> Option<TransientCause> {
        match self {
            Self::Transport { cause, .. } => *cause,
            Self::Upstream { .. } => None,
        }
    }

    /// Build a transport error from an optional cause and a message.
    pub fn transport(cause: Option<TransientCause>, message: impl Into<String>) -> Self {
        Self::Transport {
            cause,
            message: message.into(),
        }
    }
}
