//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod attributions;
pub mod audit;
pub mod contests;
pub mod corrections;
pub mod health;
pub mod submissions;

use axum::{Router, middleware};

use crate::{middleware::auth::auth_middleware, state::AppState};

/// Create all API routes
///
/// Everything but the health check requires a bearer token.
pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/contests", contests::routes())
        .nest("/submissions", submissions::routes())
        .nest("/attributions", attributions::routes())
        .nest("/corrections", corrections::routes())
        .nest("/audit", audit::routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(protected)
}
