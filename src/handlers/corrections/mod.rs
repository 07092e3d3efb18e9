//! Correction decision handlers

mod handler;
pub mod request;

pub use handler::*;
pub use request::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Correction routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(handler::get_correction))
        .route("/{id}/validate", post(handler::validate_correction))
        .route("/{id}/reject", post(handler::reject_correction))
        .route("/{id}/revision", post(handler::request_revision))
}
