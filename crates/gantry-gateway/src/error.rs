//! Mapping core errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use gantry_resolver::GatewayError;

/// Outward-facing error carrying the normalized `{statusCode, reason}` shape.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

/// Error response body.
#[derive(Debug, Serialize)]
struct ReasonBody {
    reason: String,
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let reason = self.0.reason();

        if status.is_server_error() {
            tracing::error!(status = %status, reason = %reason, "request failed");
        } else {
            tracing::debug!(status = %status, reason = %reason, "request rejected");
        }

        (status, Json(ReasonBody { reason })).into_response()
    }
}

impl ApiError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }
}
