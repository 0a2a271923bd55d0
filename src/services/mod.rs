pub mod auth;
pub mod cache;
pub mod headers;
