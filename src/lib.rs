//! Authentication helpers shared by Jarvis services.
//!
//! - App-to-app authentication: validate `X-Jarvis-App-Id` / `X-Jarvis-App-Key`
//!   against the auth service and parse the `X-Context-*` caller context
//!   ([`services::auth::authenticate`], [`middleware::auth::app`], [`api::extractors::AppAuth`]).
//! - Superuser JWT check ([`services::auth::require_superuser`], [`api::extractors::Superuser`]).
//! - Header helpers for outbound calls ([`services::headers`]).
//!
//! Everything hangs off an [`state::AppState`] built once at startup and
//! released with [`state::AppState::shutdown`].

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use config::{AppAuthConfig, ConfigError, SuperuserConfig};
pub use error::AuthError;
pub use services::auth::{
    AppAuthResult, AppCredential, AppCredentialValidator, AppValidationResult, RequestContext,
    SuperuserUser, SuperuserVerifier,
};
pub use state::AppState;
