//! The gateway's failure taxonomy and its mapping onto wire responses.
//!
//! Every failure in the acquisition or inference path is a value of
//! [`GatewayError`]; handlers propagate them with `?` and actix renders them
//! through the [`ResponseError`] impl. Nothing in the request path unwinds.

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineError;

/// Classified request failures, one variant per outcome kind.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required input field was absent; the message names the field.
    #[error("{0}")]
    MissingInput(String),

    #[error("Invalid base64 encoding")]
    InvalidEncoding,

    #[error("Invalid image format. Supported: JPEG, PNG, BMP, TIFF")]
    UnsupportedFormat,

    #[error("Invalid URL scheme. Use http:// or https://")]
    UnsupportedScheme,

    #[error("HTTPS not supported (compiled without TLS support)")]
    TlsUnavailable,

    /// The remote fetch failed; the message carries the upstream HTTP status
    /// or the transport error.
    #[error("Failed to fetch image: {0}")]
    FetchFailed(String),

    /// The payload ceiling was exceeded. `what` names the subject: "File"
    /// for uploads, "Image" for fetched bodies, "Request" for the body cap.
    #[error("{what} size exceeds 10MB limit")]
    PayloadTooLarge { what: &'static str },

    /// The request body was not well-formed structured data.
    #[error("Invalid JSON: {0}")]
    MalformedBody(String),

    /// The OCR engine failed or behaved unexpectedly.
    #[error("Internal server error: {0}")]
    Engine(String),
}

impl GatewayError {
    /// The HTTP status this outcome maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<EngineError> for GatewayError {
    fn from(err: EngineError) -> Self {
        GatewayError::Engine(err.to_string())
    }
}

/// The sole error wire shape: `{"code": <int>, "error": "<message>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub error: String,
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(ErrorBody {
                code: self.status_code().as_u16(),
                error: self.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn statuses_follow_the_outcome_table() {
        assert_eq!(
            GatewayError::MissingInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GatewayError::InvalidEncoding.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::UnsupportedFormat.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::UnsupportedScheme.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::TlsUnavailable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::FetchFailed("HTTP 404".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::PayloadTooLarge { what: "File" }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            GatewayError::MalformedBody("eof".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Engine("died".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_match_the_wire_contract() {
        assert_eq!(
            GatewayError::PayloadTooLarge { what: "File" }.to_string(),
            "File size exceeds 10MB limit"
        );
        assert_eq!(
            GatewayError::FetchFailed("HTTP 404".into()).to_string(),
            "Failed to fetch image: HTTP 404"
        );
        assert_eq!(
            GatewayError::UnsupportedScheme.to_string(),
            "Invalid URL scheme. Use http:// or https://"
        );
    }

    #[actix_web::test]
    async fn error_response_body_is_code_plus_error() {
        let response = GatewayError::InvalidEncoding.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, 400);
        assert_eq!(body.error, "Invalid base64 encoding");
    }
}
