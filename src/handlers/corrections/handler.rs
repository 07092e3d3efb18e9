//! Correction handler implementations

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{ActorContext, RejectionRecord},
    services::{CorrectionView, ValidatedCorrection},
    state::AppState,
};

use super::request::CommentRequest;

/// Get a correction with its score against the current grid
pub async fn get_correction(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CorrectionView>> {
    let view = state.workflow().get_correction(&actor, id).await?;
    Ok(Json(view))
}

/// Validate a correction and grade its submission
pub async fn validate_correction(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ValidatedCorrection>> {
    let validated = state.workflow().validate(&actor, id).await?;
    Ok(Json(validated))
}

/// Reject a correction, the corrector starts over
pub async fn reject_correction(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<Json<RejectionRecord>> {
    payload.validate()?;

    let record = state
        .workflow()
        .reject(&actor, id, &payload.comment)
        .await?;
    Ok(Json(record))
}

/// Send a correction back to its corrector for changes
pub async fn request_revision(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<Json<RejectionRecord>> {
    payload.validate()?;

    let record = state
        .workflow()
        .request_revision(&actor, id, &payload.comment)
        .await?;
    Ok(Json(record))
}
