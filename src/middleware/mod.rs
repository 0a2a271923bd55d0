/*
 * Responsibility
 * - middleware public interface
 * - auth::app::apply(...) for app-to-app auth, http::apply(...) for transport concerns
 */
pub mod auth;
pub mod http;
