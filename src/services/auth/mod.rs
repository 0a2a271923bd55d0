pub mod app_auth;
pub mod app_validator;
pub mod context;
pub mod factory;
pub mod superuser_jwt;
pub mod types;

pub use app_auth::authenticate;
pub use app_validator::AppCredentialValidator;
pub use superuser_jwt::{SuperuserVerifier, require_superuser};
pub use types::{
    AppAuthResult, AppCredential, AppValidationResult, RequestContext, SuperuserUser,
    ValidationFailure,
};
