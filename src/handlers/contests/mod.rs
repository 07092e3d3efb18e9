//! Contest management handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

/// Contest routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_contests).post(handler::create_contest))
        .route("/{id}", get(handler::get_contest))
        // Grading grid and lifecycle
        .route("/{id}/grid", put(handler::update_grading_grid))
        .route("/{id}/status", put(handler::update_contest_status))
        .route("/{id}/statistics", get(handler::get_contest_statistics))
}
