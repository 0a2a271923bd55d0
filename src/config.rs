/*
 * Responsibility
 * - Read settings from the environment (authority URL, cache TTL, JWT secret, ...)
 * - Validate them once at startup (missing or invalid values fail fast)
 * - Provide explicit config objects so callers never depend on process-global state
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

pub const ENV_AUTH_BASE_URL: &str = "JARVIS_AUTH_BASE_URL";
pub const ENV_CACHE_TTL_SECONDS: &str = "JARVIS_AUTH_CACHE_TTL_SECONDS";
pub const ENV_TIMEOUT_SECONDS: &str = "JARVIS_AUTH_TIMEOUT_SECONDS";
pub const ENV_CACHE_MAX_ENTRIES: &str = "JARVIS_AUTH_CACHE_MAX_ENTRIES";
pub const ENV_SECRET_KEY: &str = "JARVIS_AUTH_SECRET_KEY";
pub const ENV_ALGORITHM: &str = "JARVIS_AUTH_ALGORITHM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => {
                write!(f, "jarvis-auth-client not initialized: missing {}", key)
            }
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for app-to-app credential validation.
#[derive(Debug, Clone)]
pub struct AppAuthConfig {
    /// Base URL of the authority, without a trailing slash.
    pub auth_base_url: String,
    /// Upper bound for every outbound validation call.
    pub request_timeout: Duration,
    /// How long a definitive verdict is reused. Zero disables caching.
    pub cache_ttl: Duration,
    /// Expired entries are swept once the cache grows past this size.
    pub cache_max_entries: usize,
}

impl AppAuthConfig {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;

    /// Build from an explicit base URL, falling back to `JARVIS_AUTH_BASE_URL`.
    pub fn new(auth_base_url: Option<&str>) -> Result<Self, ConfigError> {
        let raw = match auth_base_url.filter(|s| !s.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => std::env::var(ENV_AUTH_BASE_URL)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .ok_or(ConfigError::Missing(ENV_AUTH_BASE_URL))?,
        };

        Ok(Self {
            auth_base_url: normalize_base_url(&raw)?,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            cache_max_entries: Self::DEFAULT_CACHE_MAX_ENTRIES,
        })
    }

    /// Returns `Ok(None)` when no authority URL is configured at all.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        if std::env::var(ENV_AUTH_BASE_URL)
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
        {
            return Ok(None);
        }

        let cache_ttl = std::env::var(ENV_CACHE_TTL_SECONDS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_CACHE_TTL);

        let request_timeout = std::env::var(ENV_TIMEOUT_SECONDS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_REQUEST_TIMEOUT);

        let cache_max_entries = std::env::var(ENV_CACHE_MAX_ENTRIES)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(Self::DEFAULT_CACHE_MAX_ENTRIES);

        Ok(Some(
            Self::new(None)?
                .with_cache_ttl(cache_ttl)
                .with_request_timeout(request_timeout)
                .with_cache_max_entries(cache_max_entries),
        ))
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = max_entries;
        self
    }

    pub fn app_ping_url(&self) -> String {
        format!("{}/internal/app-ping", self.auth_base_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed).map_err(|_| ConfigError::Invalid(ENV_AUTH_BASE_URL))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(ENV_AUTH_BASE_URL));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Settings for the superuser JWT check.
#[derive(Clone)]
pub struct SuperuserConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
}

impl fmt::Debug for SuperuserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl SuperuserConfig {
    pub const DEFAULT_ALGORITHM: &'static str = "HS256";

    /// Only HMAC algorithms make sense with a shared secret.
    pub fn new(secret_key: impl Into<String>, algorithm: &str) -> Result<Self, ConfigError> {
        let secret_key = secret_key.into();
        if secret_key.is_empty() {
            return Err(ConfigError::Missing(ENV_SECRET_KEY));
        }

        let algorithm =
            Algorithm::from_str(algorithm.trim()).map_err(|_| ConfigError::Invalid(ENV_ALGORITHM))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::Invalid(ENV_ALGORITHM));
        }

        Ok(Self {
            secret_key,
            algorithm,
        })
    }

    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(secret_key) = std::env::var(ENV_SECRET_KEY).ok().filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        let algorithm = std::env::var(ENV_ALGORITHM)
            .unwrap_or_else(|_| Self::DEFAULT_ALGORITHM.to_string());

        Self::new(secret_key, &algorithm).map(Some)
    }
}

/// Demo server configuration.
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub app_auth: Option<AppAuthConfig>,
    pub superuser: Option<SuperuserConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        Ok(Self {
            addr,
            app_env: AppEnv::from_env(),
            app_auth: AppAuthConfig::from_env()?,
            superuser: SuperuserConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_base_url_is_normalized() {
        let config = AppAuthConfig::new(Some("http://auth.internal:8000/")).unwrap();
        assert_eq!(config.auth_base_url, "http://auth.internal:8000");
        assert_eq!(
            config.app_ping_url(),
            "http://auth.internal:8000/internal/app-ping"
        );
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = AppAuthConfig::new(Some("ftp://auth.internal")).unwrap_err();
        assert_eq!(err, ConfigError::Invalid(ENV_AUTH_BASE_URL));

        let err = AppAuthConfig::new(Some("not a url")).unwrap_err();
        assert_eq!(err, ConfigError::Invalid(ENV_AUTH_BASE_URL));
    }

    #[test]
    fn superuser_defaults_to_hs256() {
        let config =
            SuperuserConfig::new("hunter2-signing", SuperuserConfig::DEFAULT_ALGORITHM).unwrap();
        assert_eq!(config.algorithm, Algorithm::HS256);
        assert!(!format!("{:?}", config).contains("hunter2-signing"));
    }

    #[test]
    fn superuser_rejects_asymmetric_algorithms_and_empty_secret() {
        assert_eq!(
            SuperuserConfig::new("secret", "RS256").unwrap_err(),
            ConfigError::Invalid(ENV_ALGORITHM)
        );
        assert_eq!(
            SuperuserConfig::new("secret", "nope").unwrap_err(),
            ConfigError::Invalid(ENV_ALGORITHM)
        );
        assert_eq!(
            SuperuserConfig::new("", "HS256").unwrap_err(),
            ConfigError::Missing(ENV_SECRET_KEY)
        );
    }
}
