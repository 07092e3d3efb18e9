//! Contest handler implementations

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::ActorContext,
    services::ContestStatistics,
    state::AppState,
};

use super::{
    request::{CreateContestRequest, UpdateGridRequest, UpdateStatusRequest},
    response::{ContestResponse, ContestsListResponse},
};

/// List all contests, most recently opened first
pub async fn list_contests(
    State(state): State<AppState>,
    _actor: ActorContext,
) -> AppResult<Json<ContestsListResponse>> {
    let contests: Vec<ContestResponse> = state
        .contests()
        .list_contests()
        .await?
        .into_iter()
        .map(ContestResponse::from)
        .collect();

    Ok(Json(ContestsListResponse {
        total: contests.len(),
        contests,
    }))
}

/// Create a new contest
pub async fn create_contest(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateContestRequest>,
) -> AppResult<(StatusCode, Json<ContestResponse>)> {
    payload.validate()?;

    let contest = state
        .contests()
        .create_contest(&actor, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(contest.into())))
}

/// Get contest by ID
pub async fn get_contest(
    State(state): State<AppState>,
    _actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContestResponse>> {
    let contest = state.contests().get_contest(id).await?;
    Ok(Json(contest.into()))
}

/// Replace or remove the grading grid
pub async fn update_grading_grid(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGridRequest>,
) -> AppResult<Json<ContestResponse>> {
    let contest = state
        .contests()
        .set_grading_grid(&actor, id, payload.grading_grid)
        .await?;
    Ok(Json(contest.into()))
}

/// Change contest status
pub async fn update_contest_status(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ContestResponse>> {
    let contest = state
        .contests()
        .set_status(&actor, id, payload.status)
        .await?;
    Ok(Json(contest.into()))
}

/// Per-status counts and score spread
pub async fn get_contest_statistics(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContestStatistics>> {
    let stats = state.contests().statistics(&actor, id).await?;
    Ok(Json(stats))
}
