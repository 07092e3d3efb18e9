//! Corrector work queue handlers

mod handler;

pub use handler::*;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Attribution routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/pending", get(handler::list_pending))
}
