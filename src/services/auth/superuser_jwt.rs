use jsonwebtoken::{DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use serde_json::Value;

use crate::config::SuperuserConfig;
use crate::error::AuthError;
use crate::services::auth::types::SuperuserUser;

/// Claims the superuser check looks at. Everything else in the token is ignored.
#[derive(Debug, Deserialize)]
struct SuperuserClaims {
    // `sub` is a stringified integer in practice; accept a JSON number too.
    #[serde(default)]
    sub: Value,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_superuser: Value,
}

/// HMAC-signed superuser token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SuperuserVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SuperuserVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperuserVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl SuperuserVerifier {
    pub fn new(config: &SuperuserConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        // `exp` and `nbf` are checked when present but not required, and no audience is expected.
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<SuperuserUser, AuthError> {
        let claims =
            jsonwebtoken::decode::<SuperuserClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|err| match err.kind() {
                    ErrorKind::ExpiredSignature => AuthError::unauthenticated("Token has expired"),
                    _ => {
                        tracing::warn!(error = %err, "superuser token rejected");
                        AuthError::unauthenticated("Invalid token")
                    }
                })?
                .claims;

        if claims.is_superuser != Value::Bool(true) {
            return Err(AuthError::forbidden("Superuser access required"));
        }

        let user_id = parse_sub(&claims.sub)?;

        Ok(SuperuserUser::new(user_id, claims.email))
    }
}

fn parse_sub(sub: &Value) -> Result<i64, AuthError> {
    let parsed = match sub {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse::<i64>().ok()),
        Value::Number(n) => Some(n.as_i64()),
        _ => Some(None),
    };

    match parsed {
        None => Err(AuthError::unauthenticated("Invalid token: missing user ID")),
        Some(None) => Err(AuthError::unauthenticated(
            "Invalid token: malformed user ID",
        )),
        Some(Some(user_id)) => Ok(user_id),
    }
}

/// Strip `Bearer ` from an `Authorization` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let authorization = authorization
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::bearer_challenge("Missing Authorization header"))?;

    authorization.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::bearer_challenge(
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
    })
}

/// Full check for an `Authorization` header.
///
/// Header problems are reported before a missing verifier, so an
/// unconfigured service still answers anonymous callers with 401.
pub fn require_superuser(
    verifier: Option<&SuperuserVerifier>,
    authorization: Option<&str>,
) -> Result<SuperuserUser, AuthError> {
    let token = bearer_token(authorization)?;

    let verifier = verifier.ok_or_else(|| {
        AuthError::configuration(
            "jarvis-auth-client not initialized: set JARVIS_AUTH_SECRET_KEY at startup",
        )
    })?;

    verifier.verify_token(token)
}
