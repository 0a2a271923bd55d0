/*
 * Responsibility
 * - Per-request app-to-app authentication: credentials -> validator -> context
 * - Produce either a complete AppAuthResult or a rejection (never a partial result)
 *
 * Notes
 * - axum wiring lives in middleware::auth::app and api::extractors
 * - Headers are only read, never mutated
 */
use axum::http::HeaderMap;

use crate::error::AuthError;
use crate::services::auth::app_validator::AppCredentialValidator;
use crate::services::auth::context::{self, header_str};
use crate::services::auth::types::{
    AppAuthResult, AppCredential, INVALID_APP_CREDENTIALS, ValidationFailure,
};
use crate::services::headers::{HEADER_APP_ID, HEADER_APP_KEY};

pub const MISSING_APP_CREDENTIALS: &str = "Missing app credentials";

/// Read the app credential headers. `None` if either is absent or blank.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<AppCredential> {
    let app_id = header_str(headers, HEADER_APP_ID)?;
    let app_key = header_str(headers, HEADER_APP_KEY)?;
    Some(AppCredential::new(app_id, app_key))
}

pub async fn authenticate(
    validator: &AppCredentialValidator,
    headers: &HeaderMap,
) -> Result<AppAuthResult, AuthError> {
    let Some(credential) = credential_from_headers(headers) else {
        tracing::warn!("request without app credentials");
        return Err(AuthError::unauthenticated(MISSING_APP_CREDENTIALS));
    };

    let outcome = validator.validate(&credential).await?;

    if !outcome.valid {
        let message = outcome
            .error
            .clone()
            .unwrap_or_else(|| INVALID_APP_CREDENTIALS.to_string());

        return Err(match outcome.failure() {
            Some(ValidationFailure::Unavailable) => {
                tracing::warn!(error = %message, "app auth rejected: auth service unavailable");
                AuthError::UpstreamUnavailable(message)
            }
            _ => {
                tracing::warn!(error = %message, "app auth rejected");
                AuthError::Unauthenticated(message)
            }
        });
    }

    let context = context::extract(headers);
    tracing::debug!(
        app = outcome.name.as_deref().unwrap_or("-"),
        household_id = context.household_id.as_deref().unwrap_or("-"),
        "app authenticated"
    );

    Ok(AppAuthResult {
        app: outcome,
        context,
    })
}
