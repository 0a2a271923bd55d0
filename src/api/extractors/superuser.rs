use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AuthError;
use crate::services::auth::{SuperuserUser, require_superuser};
use crate::state::AppState;

/// Extractor requiring `Authorization: Bearer <jwt>` with `is_superuser: true`.
pub struct Superuser(pub SuperuserUser);

impl FromRequestParts<AppState> for Superuser
where
    AppState: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        require_superuser(state.superuser_verifier(), authorization).map(Superuser)
    }
}
