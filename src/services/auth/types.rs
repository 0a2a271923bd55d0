/*
 * Responsibility
 * - Types that flow between the validator, the context extractor and handlers
 * - Construction rules that keep validation outcomes internally consistent
 *
 * Notes
 * - AppValidationResult can only be built through its named constructors, so a
 *   valid outcome never carries an error and a failed one never carries an app.
 */
use std::fmt;

use serde::Serialize;

/// The app-id/app-key pair presented by a calling service.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredential {
    pub app_id: String,
    pub app_key: String,
}

impl AppCredential {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
        }
    }
}

impl fmt::Debug for AppCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredential")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// Why a validation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The authority answered 401.
    InvalidCredentials,
    /// The authority answered with some other non-success status.
    UnexpectedStatus(u16),
    /// 200, but the body could not be read.
    MalformedResponse,
    /// Timeout, refused connection, DNS failure, ...
    Unavailable,
}

impl ValidationFailure {
    /// Verdicts that are safe to reuse for the cache TTL.
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}

pub const INVALID_APP_CREDENTIALS: &str = "Invalid app credentials";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppValidationResult {
    pub valid: bool,
    pub app_id: Option<String>,
    pub name: Option<String>,
    pub error: Option<String>,
    #[serde(skip)]
    failure: Option<ValidationFailure>,
}

impl AppValidationResult {
    pub fn valid(app_id: Option<String>, name: Option<String>) -> Self {
        Self {
            valid: true,
            app_id,
            name,
            error: None,
            failure: None,
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::failed(ValidationFailure::InvalidCredentials, INVALID_APP_CREDENTIALS)
    }

    pub fn unexpected_status(status: u16) -> Self {
        Self::failed(
            ValidationFailure::UnexpectedStatus(status),
            format!("Auth service error: {}", status),
        )
    }

    pub fn malformed_response(detail: impl fmt::Display) -> Self {
        Self::failed(
            ValidationFailure::MalformedResponse,
            format!("Auth service returned an invalid response: {}", detail),
        )
    }

    pub fn unavailable(detail: impl fmt::Display) -> Self {
        Self::failed(
            ValidationFailure::Unavailable,
            format!("Auth service unavailable: {}", detail),
        )
    }

    fn failed(failure: ValidationFailure, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            app_id: None,
            name: None,
            error: Some(error.into()),
            failure: Some(failure),
        }
    }

    pub fn failure(&self) -> Option<ValidationFailure> {
        self.failure
    }

    /// Whether the outcome may be served from cache.
    pub fn is_cacheable(&self) -> bool {
        match self.failure {
            None => self.valid,
            Some(failure) => failure.is_definitive(),
        }
    }
}

/// Caller context propagated through `X-Context-*` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub household_id: Option<String>,
    pub node_id: Option<String>,
    pub user_id: Option<i64>,
    pub household_member_ids: Vec<i64>,
}

/// What handlers receive once a request is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppAuthResult {
    pub app: AppValidationResult,
    pub context: RequestContext,
}

pub const SUPERUSER_AUTH_TYPE: &str = "superuser_jwt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuperuserUser {
    pub user_id: i64,
    pub email: Option<String>,
    pub auth_type: &'static str,
}

impl SuperuserUser {
    pub fn new(user_id: i64, email: Option<String>) -> Self {
        Self {
            user_id,
            email,
            auth_type: SUPERUSER_AUTH_TYPE,
        }
    }
}
