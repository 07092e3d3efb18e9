//! Anonymat - Anonymous Contest Submission & Correction Workflow
//!
//! This library provides the core functionality for running anonymous
//! contest corrections: candidates deposit files under an anonymous
//! identifier, administrators attribute copies to correctors, and every
//! correction is validated by an administrator before it becomes a grade.
//!
//! # Features
//!
//! - Encrypted storage of deposited file paths (AES-256-GCM, key rotation)
//! - Grading grids with per-criterion maxima, plus legacy total scores
//! - Single-corrector attribution with audited reassignment
//! - Validation, rejection and revision requests with a full history
//! - Best-effort audit trail that never blocks the workflow
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Workflow rules
//! - **Store**: Persistence boundary, backed by Postgres or memory
//! - **Models**: Domain models

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

mod test_utils;

use axum::Router;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use constants::MAX_REQUEST_BODY_BYTES;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Build the full HTTP application
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", handlers::routes(state.clone()))
        .layer(axum::middleware::from_fn(
            middleware::logging::logging_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
