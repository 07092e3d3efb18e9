//! Attribution handler implementations

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ActorContext, Attribution},
    state::AppState,
};

/// Pending copies query parameters
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    /// Defaults to the caller; only admins may name another corrector
    pub corrector_id: Option<Uuid>,
}

/// Pending copies response
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub corrector_id: Uuid,
    pub attributions: Vec<Attribution>,
}

/// Copies a corrector still has to grade
pub async fn list_pending(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<PendingQuery>,
) -> AppResult<Json<PendingResponse>> {
    let corrector_id = query.corrector_id.unwrap_or(actor.actor_id);
    let attributions = state
        .attributions()
        .awaiting_correction(&actor, corrector_id)
        .await?;

    Ok(Json(PendingResponse {
        corrector_id,
        attributions,
    }))
}
