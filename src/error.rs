/*
 * Responsibility
 * - Authentication error taxonomy shared by the validator, extractors and middleware
 * - IntoResponse implementation (HTTP status / JSON error body)
 * - ConfigError -> AuthError conversion (deployment mistakes surface as 500)
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The client was not initialized (or was shut down). Server-side fault.
    #[error("{0}")]
    Configuration(String),

    /// Missing or malformed credentials, invalid or expired token.
    #[error("{0}")]
    Unauthenticated(String),

    /// Same as `Unauthenticated`, but the response carries `WWW-Authenticate: Bearer`.
    #[error("{0}")]
    BearerChallenge(String),

    /// Valid identity without the required privilege.
    #[error("{0}")]
    Forbidden(String),

    /// The authority could not be reached. Fail-closed: the caller sees a 401.
    #[error("{0}")]
    UpstreamUnavailable(String),
}

impl AuthError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn bearer_challenge(message: impl Into<String>) -> Self {
        Self::BearerChallenge(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Unauthenticated(_)
            | AuthError::BearerChallenge(_)
            | AuthError::UpstreamUnavailable(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "NOT_INITIALIZED",
            AuthError::Unauthenticated(_) | AuthError::BearerChallenge(_) => "UNAUTHORIZED",
            AuthError::Forbidden(_) => "FORBIDDEN",
            AuthError::UpstreamUnavailable(_) => "AUTH_SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = matches!(self, AuthError::BearerChallenge(_));

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ConfigError> for AuthError {
    fn from(e: ConfigError) -> Self {
        AuthError::Configuration(e.to_string())
    }
}
