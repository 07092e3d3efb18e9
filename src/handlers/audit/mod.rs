//! Audit trail handlers

mod handler;

pub use handler::*;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Audit routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(handler::list_audit_entries))
}
