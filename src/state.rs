/*
 * Responsibility
 * - The client handle shared by every request (AppState)
 *   - app_auth: credential validator (shared HTTP client + verdict cache)
 *   - superuser: JWT verifier
 * - Built once at startup and injected into the router, no process-global state
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::config::Config;
use crate::error::AuthError;
use crate::services::auth::{AppCredentialValidator, SuperuserVerifier, factory};

#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub app_auth: Option<Arc<AppCredentialValidator>>,
    pub superuser: Option<Arc<SuperuserVerifier>>,
}

impl AppState {
    pub fn new(
        app_auth: Option<Arc<AppCredentialValidator>>,
        superuser: Option<Arc<SuperuserVerifier>>,
    ) -> Self {
        Self {
            app_auth,
            superuser,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.app_auth.as_ref().map(factory::build_app_validator),
            config.superuser.as_ref().map(factory::build_superuser_verifier),
        )
    }

    pub fn app_validator(&self) -> Result<&AppCredentialValidator, AuthError> {
        self.app_auth.as_deref().ok_or_else(|| {
            AuthError::configuration(
                "jarvis-auth-client not initialized: set JARVIS_AUTH_BASE_URL at startup",
            )
        })
    }

    pub fn superuser_verifier(&self) -> Option<&SuperuserVerifier> {
        self.superuser.as_deref()
    }

    /// Release outbound resources. Idempotent.
    pub fn shutdown(&self) {
        if let Some(validator) = &self.app_auth {
            validator.shutdown();
        }
    }
}
