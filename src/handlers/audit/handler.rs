//! Audit handler implementations

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{ActorContext, AuditEntry},
    state::AppState,
};

/// Audit listing query parameters
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

/// Most recent audit entries, newest first
pub async fn list_audit_entries(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let entries = state.audit().recent(&actor, query.limit).await?;
    Ok(Json(entries))
}
