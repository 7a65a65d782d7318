//! Body transcoding policy.
//!
//! The inbound body is re-encoded before forwarding, keyed on the declared
//! content type. The set of supported encodings is a closed enum so adding
//! one is a compile-time-checked change.

use bytes::Bytes;

use gantry_registry::OutboundBody;

use crate::error::{GatewayError, Result};

/// How an inbound body is transcoded for the downstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/json`: parsed as structured data; a parse failure is a
    /// hard error.
    Json,
    /// `text/plain` or `text/html`: decoded to text.
    Text,
    /// Anything else: bytes pass through unmodified.
    Raw,
}

impl BodyEncoding {
    /// Select the encoding from a `content-type` header value.
    ///
    /// The value is truncated at the first `;` before matching, so charset
    /// and other parameters are ignored. An absent header selects `Raw`.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(value) = content_type else {
            return Self::Raw;
        };

        let media_type = value.split(';').next().unwrap_or("").trim();
        match media_type {
            "application/json" => Self::Json,
            "text/plain" | "text/html" => Self::Text,
            _ => Self::Raw,
        }
    }

    /// Transcode a body for the downstream call.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BodyDecoding`] when a body declared as JSON
    /// fails to parse.
    pub fn transcode(self, body: &Bytes) -> Result<OutboundBody> {
        match self {
            Self::Json => serde_json::from_slice(body)
                .map(OutboundBody::Json)
                .map_err(|e| GatewayError::BodyDecoding(e.to_string())),
            Self::Text => Ok(OutboundBody::Text(
                String::from_utf8_lossy(body).into_owned(),
            )),
            Self::Raw => Ok(OutboundBody::Raw(body.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_by_media_type() {
        assert_eq!(
            BodyEncoding::from_content_type(Some("application/json")),
            BodyEncoding::Json
        );
        assert_eq!(
            BodyEncoding::from_content_type(Some("text/plain")),
            BodyEncoding::Text
        );
        assert_eq!(
            BodyEncoding::from_content_type(Some("text/html")),
            BodyEncoding::Text
        );
        assert_eq!(
            BodyEncoding::from_content_type(Some("application/octet-stream")),
            BodyEncoding::Raw
        );
        assert_eq!(BodyEncoding::from_content_type(None), BodyEncoding::Raw);
    }

    #[test]
    fn parameters_after_semicolon_are_ignored() {
        assert_eq!(
            BodyEncoding::from_content_type(Some("application/json;charset=utf-8")),
            BodyEncoding::Json
        );
        assert_eq!(
            BodyEncoding::from_content_type(Some("text/plain; charset=iso-8859-1")),
            BodyEncoding::Text
        );
    }

    #[test]
    fn json_bodies_parse_to_structured_data() {
        let body = Bytes::from_static(b"{\"qty\": 3}");
        let transcoded = BodyEncoding::Json.transcode(&body).unwrap();
        assert!(matches!(
            transcoded,
            OutboundBody::Json(value) if value == serde_json::json!({"qty": 3})
        ));
    }

    #[test]
    fn malformed_json_is_a_hard_error() {
        let body = Bytes::from_static(b"{not json");
        let err = BodyEncoding::Json.transcode(&body).unwrap_err();
        assert!(matches!(err, GatewayError::BodyDecoding(_)));
    }

    #[test]
    fn text_bodies_decode() {
        let body = Bytes::from_static(b"plain text");
        let transcoded = BodyEncoding::Text.transcode(&body).unwrap();
        assert!(matches!(
            transcoded,
            OutboundBody::Text(text) if text == "plain text"
        ));
    }

    #[test]
    fn unknown_types_pass_bytes_through() {
        let body = Bytes::from_static(b"\x00\x01\x02");
        let transcoded = BodyEncoding::Raw.transcode(&body).unwrap();
        assert!(matches!(
            transcoded,
            OutboundBody::Raw(bytes) if bytes == body
        ));
    }
}
