//! App-to-app authentication (X-Jarvis-App-Id / X-Jarvis-App-Key) -> AppAuthResult in extensions
//!
//! - Missing credentials are rejected without calling the authority.
//! - Rejected or unverifiable credentials stop the request here (fail-closed).
//! - Handlers read the result through `api::extractors::AppAuth`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AuthError;
use crate::services::auth::app_auth;
use crate::state::AppState;

/// Require app credentials on every route of `router`.
///
/// ```ignore
/// let internal = api::v1::routes::internal();
/// let internal = middleware::auth::app::apply(internal, state.clone());
/// app = app.nest("/api/v1", internal);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, app_auth_middleware))
}

pub async fn app_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let validator = state.app_validator()?;

    // Dropping this future (client gone) also drops the outbound call.
    let result = app_auth::authenticate(validator, req.headers()).await?;

    req.extensions_mut().insert(result);

    Ok(next.run(req).await)
}
