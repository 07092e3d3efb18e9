//! Submission handler implementations

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{ActorContext, Attribution, Reattribution},
    services::{CorrectionView, FileAccess, SubmissionHistory, SubmissionView},
    state::AppState,
};

use super::{
    request::{AssignRequest, DepositRequest, ReplaceFileRequest},
    response::{AttributionResponse, SubmissionResponse},
};

/// Deposit a file for a contest
pub async fn deposit_submission(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<DepositRequest>,
) -> AppResult<(StatusCode, Json<SubmissionResponse>)> {
    payload.validate()?;

    let submission = state
        .submissions()
        .deposit(&actor, payload.contest_id, &payload.path)
        .await?;

    Ok((StatusCode::CREATED, Json(submission.into())))
}

/// Get submission by ID
pub async fn get_submission(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionView>> {
    let view = state.submissions().view(&actor, id).await?;
    Ok(Json(view))
}

/// Modifications, corrections and rejections of a submission
pub async fn get_submission_history(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionHistory>> {
    let history = state.submissions().history(&actor, id).await?;
    Ok(Json(history))
}

/// Resolve the deposited file for download
///
/// A file that cannot be read comes back as `inaccessible` with a 200,
/// the submission itself stays usable.
pub async fn open_submission_file(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FileAccess>> {
    let access = state.submissions().open_file(&actor, id).await?;
    Ok(Json(access))
}

/// Replace the deposited file while no correction is under way
pub async fn replace_submission_file(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceFileRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    payload.validate()?;

    let submission = state
        .submissions()
        .replace_file(&actor, id, &payload.path, &payload.reason)
        .await?;

    Ok(Json(submission.into()))
}

/// Current attribution, admin only
pub async fn get_attribution(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AttributionResponse>> {
    actor.require_admin()?;

    let attribution = state.attributions().find(id).await?;
    Ok(Json(AttributionResponse {
        submission_id: id,
        attribution,
    }))
}

/// Assign a corrector to an unattributed submission
pub async fn assign_corrector(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<(StatusCode, Json<Attribution>)> {
    let attribution = state
        .attributions()
        .assign(&actor, id, payload.corrector_id)
        .await?;
    Ok((StatusCode::CREATED, Json(attribution)))
}

/// Move a submission to another corrector
pub async fn reassign_corrector(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<Reattribution>> {
    let reattribution = state
        .attributions()
        .reassign(&actor, id, payload.corrector_id)
        .await?;
    Ok(Json(reattribution))
}

/// Remove the attribution, sending the submission back to pending
pub async fn unassign_corrector(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AttributionResponse>> {
    let removed = state.attributions().unassign(&actor, id).await?;
    Ok(Json(AttributionResponse {
        submission_id: id,
        attribution: removed,
    }))
}

/// Submit an evaluation
///
/// The body is the evaluation document itself. It is stored exactly as
/// received, so it is taken as text rather than re-serialized JSON.
pub async fn submit_evaluation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    body: String,
) -> AppResult<(StatusCode, Json<CorrectionView>)> {
    let view = state
        .workflow()
        .submit_evaluation(&actor, id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}
