//! Submission handlers
//!
//! Deposits, file access, attribution and correction entry for a single
//! submission. Every route is keyed by the submission id.

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Submission routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::deposit_submission))
        .route("/{id}", get(handler::get_submission))
        .route("/{id}/history", get(handler::get_submission_history))
        // File access
        .route(
            "/{id}/file",
            get(handler::open_submission_file).put(handler::replace_submission_file),
        )
        // Attribution
        .route(
            "/{id}/attribution",
            get(handler::get_attribution)
                .post(handler::assign_corrector)
                .put(handler::reassign_corrector)
                .delete(handler::unassign_corrector),
        )
        // Correction entry
        .route("/{id}/corrections", post(handler::submit_evaluation))
}
