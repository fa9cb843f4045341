//! Mapping of delivery outcomes to HTTP responses.
//!
//! The caller only ever sees a status code and a short fixed reason; diagnostic
//! detail stays in the service logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// The answer to one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResponse {
    /// The pipeline ran to completion.
    Processed,
    /// The delivery was valid but not actionable.
    Ignored,
    /// The body or the signature header could not be parsed.
    BadRequest,
    /// The signature was missing or did not match.
    Unauthorized,
    /// The body exceeded the configured limit.
    PayloadTooLarge,
    /// The pipeline failed, or the body could not be read.
    InternalError,
}

impl WebhookResponse {
    /// HTTP status for this outcome.
    pub fn status(self) -> StatusCode {
        match self {
            Self::Processed | Self::Ignored => StatusCode::OK,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text reason returned as the body.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Processed => "Webhook processed successfully",
            Self::Ignored => "Event ignored",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::InternalError => "Internal Server Error",
        }
    }
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        (self.status(), self.reason()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_is_success_not_error() {
        assert_eq!(WebhookResponse::Ignored.status(), StatusCode::OK);
        assert_ne!(
            WebhookResponse::Ignored.reason(),
            WebhookResponse::Processed.reason()
        );
    }

    #[test]
    fn auth_failures_do_not_explain_themselves() {
        assert_eq!(WebhookResponse::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebhookResponse::Unauthorized.reason(), "Unauthorized");
    }
}
