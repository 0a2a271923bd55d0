//! Factory: build the auth services from application `Config`.
use std::sync::Arc;

use crate::config::{AppAuthConfig, SuperuserConfig};
use crate::services::auth::{AppCredentialValidator, SuperuserVerifier};

pub fn build_app_validator(config: &AppAuthConfig) -> Arc<AppCredentialValidator> {
    tracing::info!(
        auth_base_url = %config.auth_base_url,
        cache_ttl_seconds = config.cache_ttl.as_secs(),
        timeout_seconds = config.request_timeout.as_secs(),
        "app-to-app auth enabled"
    );
    Arc::new(AppCredentialValidator::new(config.clone()))
}

pub fn build_superuser_verifier(config: &SuperuserConfig) -> Arc<SuperuserVerifier> {
    tracing::info!(algorithm = ?config.algorithm, "superuser JWT check enabled");
    Arc::new(SuperuserVerifier::new(config))
}
