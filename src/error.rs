/*
 * Responsibility
 * - Authentication failure taxonomy (AuthError)
 * - Mapping of every failure to an HTTP response (status + plain-text body)
 * - `debug` controls whether verifier / revocation details leave the process
 */
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const BAD_HEADER_FORMAT_MESSAGE: &str =
    r#"Bad Authorization header format. Format is "Authorization: Bearer <token>""#;
pub const INVALID_SECRET_MESSAGE: &str = "Invalid secret";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";
pub const REVOKED_TOKEN_DETAIL: &str = "Revoked token";

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No token located, or the Authorization header is not `Bearer <token>`.
    #[error("bad authorization header format")]
    BadHeaderFormat,
    /// Neither the request state nor the configuration carries a secret.
    #[error("no secret available for verification")]
    NoSecret,
    #[error("token verification failed: {detail}")]
    Verification { detail: String },
    #[error("token has been revoked")]
    Revoked,
    #[error("revocation check failed: {detail}")]
    RevocationFailure { detail: String },
    /// Raised by a custom token locator; status and message are emitted as-is.
    #[error("token locator rejected the request: {status} {message}")]
    Locator { status: StatusCode, message: String },
}

impl AuthError {
    pub fn verification(detail: impl Into<String>) -> Self {
        Self::Verification {
            detail: detail.into(),
        }
    }

    pub fn revocation_failure(detail: impl Into<String>) -> Self {
        Self::RevocationFailure {
            detail: detail.into(),
        }
    }

    pub fn locator(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Locator {
            status,
            message: message.into(),
        }
    }

    /// Whether `passthrough` may swallow this failure.
    ///
    /// Custom locator failures are an explicit decision of the caller and are
    /// always emitted.
    pub fn is_absorbable(&self) -> bool {
        !matches!(self, Self::Locator { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Locator { status, .. } => *status,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message (without the trailing newline).
    pub fn public_message(&self, debug: bool) -> String {
        match self {
            Self::BadHeaderFormat => BAD_HEADER_FORMAT_MESSAGE.to_string(),
            Self::NoSecret => INVALID_SECRET_MESSAGE.to_string(),
            Self::Verification { detail } if debug => {
                format!("{INVALID_TOKEN_MESSAGE} - {detail}")
            }
            Self::Verification { .. } => INVALID_TOKEN_MESSAGE.to_string(),
            Self::Revoked => format!("{INVALID_TOKEN_MESSAGE} - {REVOKED_TOKEN_DETAIL}"),
            Self::RevocationFailure { detail } if debug => {
                format!("{INVALID_TOKEN_MESSAGE} - {detail}")
            }
            Self::RevocationFailure { .. } => {
                format!("{INVALID_TOKEN_MESSAGE} - {REVOKED_TOKEN_DETAIL}")
            }
            Self::Locator { message, .. } => message.clone(),
        }
    }

    pub fn into_response_with(self, debug: bool) -> Response {
        let body = match &self {
            // custom locator messages are forwarded verbatim
            Self::Locator { message, .. } => message.clone(),
            other => format!("{}\n", other.public_message(debug)),
        };

        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
