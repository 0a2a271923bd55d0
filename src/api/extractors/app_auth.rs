use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AuthError;
use crate::services::auth::{AppAuthResult, app_auth};
use crate::state::AppState;

/// Extractor giving handlers the `AppAuthResult` of the current request.
///
/// Behind `middleware::auth::app` it reuses the result stored in the request
/// extensions. On a route without the layer it authenticates by itself, so it
/// also works as a per-handler dependency.
pub struct AppAuth(pub AppAuthResult);

impl FromRequestParts<AppState> for AppAuth
where
    AppState: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(result) = parts.extensions.get::<AppAuthResult>() {
            return Ok(AppAuth(result.clone()));
        }

        let validator = state.app_validator()?;
        let result = app_auth::authenticate(validator, &parts.headers).await?;
        parts.extensions.insert(result.clone());

        Ok(AppAuth(result))
    }
}
