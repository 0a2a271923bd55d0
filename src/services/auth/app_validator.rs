use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::AppAuthConfig;
use crate::error::AuthError;
use crate::services::auth::types::{AppCredential, AppValidationResult};
use crate::services::cache::{CacheKey, ValidationCache};
use crate::services::headers::{HEADER_APP_ID, HEADER_APP_KEY};

/// Body of a successful `GET /internal/app-ping`.
#[derive(Debug, Deserialize)]
struct AppPingResponse {
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

// Lifecycle of the shared outbound client.
enum HttpSlot {
    Idle,
    Ready(Client),
    Closed,
}

/// Validates app credentials against the authority.
///
/// - The HTTP client is built on first use and shared by every request.
/// - `shutdown` releases it; later calls fail with a configuration error.
/// - Definitive verdicts are cached for `cache_ttl`.
pub struct AppCredentialValidator {
    config: AppAuthConfig,
    http: Mutex<HttpSlot>,
    cache: ValidationCache<AppValidationResult>,
}

impl std::fmt::Debug for AppCredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentialValidator")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

impl AppCredentialValidator {
    pub fn new(config: AppAuthConfig) -> Self {
        let cache = ValidationCache::new(config.cache_ttl, config.cache_max_entries);
        Self {
            config,
            http: Mutex::new(HttpSlot::Idle),
            cache,
        }
    }

    pub fn config(&self) -> &AppAuthConfig {
        &self.config
    }

    pub fn cache(&self) -> &ValidationCache<AppValidationResult> {
        &self.cache
    }

    /// Check a credential pair.
    ///
    /// Rejections and authority outages come back as `Ok` outcomes with
    /// `valid == false`. `Err` means the validator itself is unusable.
    pub async fn validate(
        &self,
        credential: &AppCredential,
    ) -> Result<AppValidationResult, AuthError> {
        let client = self.http_client()?;
        let key = CacheKey::for_credential(&credential.app_id, &credential.app_key);

        let outcome = self
            .cache
            .get_or_load(
                key,
                || self.ping(&client, credential),
                AppValidationResult::is_cacheable,
            )
            .await;

        Ok(outcome)
    }

    async fn ping(&self, client: &Client, credential: &AppCredential) -> AppValidationResult {
        let response = match client
            .get(self.config.app_ping_url())
            .header(HEADER_APP_ID, &credential.app_id)
            .header(HEADER_APP_KEY, &credential.app_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let detail =
                    describe_transport_error(&err.without_url(), self.config.request_timeout);
                tracing::warn!(error = %detail, "auth service unavailable");
                return AppValidationResult::unavailable(detail);
            }
        };

        let status = response.status();
        // Only a plain 200 is a verdict; other 2xx replies are unexpected.
        if status == StatusCode::OK {
            let body = response
                .json::<AppPingResponse>()
                .await
                .map_err(reqwest::Error::without_url);
            return match body {
                Ok(body) => AppValidationResult::valid(body.app_id, body.name),
                Err(err) if err.is_timeout() => {
                    let detail = describe_transport_error(&err, self.config.request_timeout);
                    tracing::warn!(error = %detail, "auth service unavailable");
                    AppValidationResult::unavailable(detail)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "auth service returned an unreadable body");
                    AppValidationResult::malformed_response(err)
                }
            };
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("auth service rejected app credentials");
            AppValidationResult::invalid_credentials()
        } else {
            tracing::warn!(status = status.as_u16(), "unexpected auth service status");
            AppValidationResult::unexpected_status(status.as_u16())
        }
    }

    fn http_client(&self) -> Result<Client, AuthError> {
        let mut slot = self.http.lock().unwrap_or_else(PoisonError::into_inner);
        match &*slot {
            HttpSlot::Ready(client) => return Ok(client.clone()),
            HttpSlot::Closed => {
                return Err(AuthError::configuration(
                    "jarvis-auth-client has been shut down",
                ));
            }
            HttpSlot::Idle => {}
        }

        let client = Client::builder()
            .timeout(self.config.request_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AuthError::configuration(format!("failed to create HTTP client: {e}")))?;
        *slot = HttpSlot::Ready(client.clone());
        Ok(client)
    }

    /// Release the shared HTTP client and forget cached verdicts. Safe to call twice.
    pub fn shutdown(&self) {
        let previous = {
            let mut slot = self.http.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, HttpSlot::Closed)
        };
        self.cache.clear();

        if matches!(previous, HttpSlot::Ready(_)) {
            tracing::info!("released auth service http client");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        matches!(
            *self.http.lock().unwrap_or_else(PoisonError::into_inner),
            HttpSlot::Closed
        )
    }
}

fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("request timed out after {}ms", timeout.as_millis())
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::types::ValidationFailure;
    use std::sync::Arc;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn validator_for(uri: &str) -> AppCredentialValidator {
        AppCredentialValidator::new(AppAuthConfig::new(Some(uri)).unwrap())
    }

    fn credential() -> AppCredential {
        AppCredential::new("command-center", "cc-key")
    }

    #[tokio::test]
    async fn success_copies_app_identity_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/app-ping"))
            .and(header("X-Jarvis-App-Id", "command-center"))
            .and(header("X-Jarvis-App-Key", "cc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "app_id": "command-center",
                "name": "Command Center",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = validator_for(&server.uri())
            .validate(&credential())
            .await
            .unwrap();

        assert!(outcome.valid);
        assert_eq!(outcome.app_id.as_deref(), Some("command-center"));

        // Credentials travel as headers only.
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].url.query().is_none());
        assert_eq!(outcome.name.as_deref(), Some("Command Center"));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/app-ping"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let outcome = validator_for(&server.uri())
            .validate(&credential())
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.error.as_deref(), Some("Invalid app credentials"));
        assert_eq!(outcome.failure(), Some(ValidationFailure::InvalidCredentials));
    }

    #[tokio::test]
    async fn other_status_includes_the_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = validator_for(&server.uri())
            .validate(&credential())
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.failure(), Some(ValidationFailure::UnexpectedStatus(503)));
        assert!(outcome.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn non_200_success_status_is_not_a_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "app_id": "command-center",
                "name": "Command Center",
            })))
            .mount(&server)
            .await;

        let outcome = validator_for(&server.uri())
            .validate(&credential())
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.app_id, None);
        assert_eq!(outcome.failure(), Some(ValidationFailure::UnexpectedStatus(202)));
        assert_eq!(outcome.error.as_deref(), Some("Auth service error: 202"));
    }

    #[tokio::test]
    async fn unreachable_authority_is_an_outcome_not_a_fault() {
        let validator = validator_for("http://127.0.0.1:1");

        let outcome = validator.validate(&credential()).await.unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.failure(), Some(ValidationFailure::Unavailable));
        let error = outcome.error.unwrap();
        assert!(error.contains("unavailable"));
        // The authority address stays out of caller-facing messages.
        assert!(!error.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn slow_authority_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = AppAuthConfig::new(Some(&server.uri()))
            .unwrap()
            .with_request_timeout(Duration::from_millis(100));
        let outcome = AppCredentialValidator::new(config)
            .validate(&credential())
            .await
            .unwrap();

        assert!(!outcome.valid);
        let error = outcome.error.unwrap();
        assert!(error.contains("unavailable"));
        assert!(error.contains("timed out"));
    }

    #[tokio::test]
    async fn unreadable_success_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let outcome = validator_for(&server.uri())
            .validate(&credential())
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.failure(), Some(ValidationFailure::MalformedResponse));
    }

    #[tokio::test]
    async fn verdicts_are_cached_per_credential_pair() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-Jarvis-App-Key", "cc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "app_id": "command-center",
                "name": "Command Center",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("X-Jarvis-App-Key", "wrong"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let validator = validator_for(&server.uri());
        for _ in 0..3 {
            assert!(validator.validate(&credential()).await.unwrap().valid);
        }

        let wrong = AppCredential::new("command-center", "wrong");
        for _ in 0..3 {
            assert!(!validator.validate(&wrong).await.unwrap().valid);
        }
    }

    #[tokio::test]
    async fn outages_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let validator = validator_for(&server.uri());
        validator.validate(&credential()).await.unwrap();
        validator.validate(&credential()).await.unwrap();
    }

    #[tokio::test]
    async fn expired_verdicts_are_revalidated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "app_id": "command-center",
                "name": "Command Center",
            })))
            .expect(2)
            .mount(&server)
            .await;

        let config = AppAuthConfig::new(Some(&server.uri()))
            .unwrap()
            .with_cache_ttl(Duration::from_millis(100));
        let validator = AppCredentialValidator::new(config);

        validator.validate(&credential()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        validator.validate(&credential()).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_outbound_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "app_id": "command-center",
                        "name": "Command Center",
                    }))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let validator = Arc::new(validator_for(&server.uri()));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let validator = Arc::clone(&validator);
            handles.push(tokio::spawn(async move {
                validator.validate(&credential()).await.unwrap()
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().valid);
        }
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_blocks_new_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "app_id": "command-center",
                "name": "Command Center",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let validator = validator_for(&server.uri());
        assert!(validator.validate(&credential()).await.unwrap().valid);

        validator.shutdown();
        validator.shutdown();
        assert!(validator.is_shut_down());
        assert!(validator.cache().is_empty());

        let err = validator.validate(&credential()).await.unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[tokio::test]
    async fn shutdown_before_first_use_is_fine() {
        let validator = validator_for("http://127.0.0.1:1");
        validator.shutdown();
        assert!(validator.validate(&credential()).await.is_err());
    }
}
