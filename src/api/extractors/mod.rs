/*!
 * Handler extractors for authenticated requests
 *
 * Public API:
 * - AppAuth: app-to-app result (from the middleware, or authenticated on the spot)
 * - Superuser: caller holding a superuser JWT
 */

mod app_auth;
mod superuser;

pub use app_auth::AppAuth;
pub use superuser::Superuser;
