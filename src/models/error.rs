//! Rejection taxonomy for Slack request verification.

use actix_web::{
    HttpResponse, ResponseError,
    http::{StatusCode, header::ContentType},
};

/// Reasons a request is refused before it reaches the downstream handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("request did not contain a request timestamp")]
    MissingTimestamp,

    #[error("failed to parse request timestamp")]
    InvalidTimestamp,

    #[error("request is too old to be handled")]
    RequestTooOld,

    #[error("request does not provide a Slack-signed signature")]
    MissingSignature,

    #[error("failed to read body")]
    BodyRead,

    #[error("request is not signed with a valid Slack signature")]
    InvalidSignature,
}

impl VerificationError {
    /// Stable label used in metrics and audit logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingTimestamp => "missing_timestamp",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::RequestTooOld => "request_too_old",
            Self::MissingSignature => "missing_signature",
            Self::BodyRead => "body_read",
            Self::InvalidSignature => "invalid_signature",
        }
    }

    /// Whether the failure points at the caller rather than at this server
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl ResponseError for VerificationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTimestamp | Self::RequestTooOld => StatusCode::BAD_REQUEST,
            Self::MissingSignature | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            // A timestamp that is present but malformed is treated as a server-side defect
            Self::InvalidTimestamp | Self::BodyRead => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(format!("{self}\n"))
    }
}
