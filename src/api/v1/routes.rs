/*
 * Responsibility
 * - v1 URL layout
 * - /app/... sits behind the app-to-app auth layer
 * - /admin/... uses the Superuser extractor per handler
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    health::health,
    whoami::{admin_whoami, app_forwarded_context, app_whoami},
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let app = Router::new()
        .route("/whoami", get(app_whoami))
        .route("/context-headers", get(app_forwarded_context));
    let app = middleware::auth::app::apply(app, state);

    Router::new()
        .route("/health", get(health))
        .nest("/app", app)
        .route("/admin/whoami", get(admin_whoami))
}
