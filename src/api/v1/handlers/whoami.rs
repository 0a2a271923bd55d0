/*
 * Responsibility
 * - Echo endpoints showing what a handler receives after authentication
 * - /app/...   : app-to-app callers (AppAuth)
 * - /admin/... : superuser JWT callers (Superuser)
 */
use std::collections::BTreeMap;

use axum::Json;

use crate::api::extractors::{AppAuth, Superuser};
use crate::services::auth::{AppAuthResult, SuperuserUser};

pub async fn app_whoami(AppAuth(auth): AppAuth) -> Json<AppAuthResult> {
    Json(auth)
}

/// Headers a handler would attach when calling the next service on behalf of the same caller.
pub async fn app_forwarded_context(
    AppAuth(auth): AppAuth,
) -> Json<BTreeMap<&'static str, String>> {
    Json(auth.context.to_headers().into_iter().collect())
}

pub async fn admin_whoami(Superuser(user): Superuser) -> Json<SuperuserUser> {
    Json(user)
}
