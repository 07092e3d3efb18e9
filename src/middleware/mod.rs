//! HTTP middleware

pub mod auth;
pub mod logging;

pub use auth::{Claims, auth_middleware, verify_token};
pub use logging::logging_middleware;
