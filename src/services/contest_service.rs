//! Contest service

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{ActorContext, AuditAction, Contest, ContestStatus, GradingGrid, NewContest},
    utils::{
        time::is_valid_window,
        validation::{validate_contest_title, validate_grading_grid},
    },
};

use super::{AuditLog, statistics::ContestStatistics};

/// Contest service for business logic
pub struct ContestService {
    store: Arc<dyn Store>,
    audit: Arc<AuditLog>,
}

impl ContestService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditLog>) -> Self {
        Self { store, audit }
    }

    /// Create a new contest in `draft`
    pub async fn create_contest(
        &self,
        actor: &ActorContext,
        mut contest: NewContest,
    ) -> AppResult<Contest> {
        actor.require_admin()?;

        contest.title = validate_contest_title(&contest.title)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if !is_valid_window(contest.opens_at, contest.closes_at) {
            return Err(AppError::Validation(
                "Contest must open before it closes".to_string(),
            ));
        }
        if let Some(grid) = &contest.grading_grid {
            validate_grading_grid(grid).map_err(AppError::Validation)?;
        }

        let created = self.store.create_contest(&contest).await?;
        tracing::info!(contest_id = %created.id, title = %created.title, "Contest created");

        Ok(created)
    }

    /// Get contest by ID
    pub async fn get_contest(&self, id: Uuid) -> AppResult<Contest> {
        self.store
            .find_contest(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }

    pub async fn list_contests(&self) -> AppResult<Vec<Contest>> {
        self.store.list_contests().await
    }

    /// Replace or remove the grading grid.
    ///
    /// Refused with `GridLocked` while any submission of the contest has a
    /// correction awaiting validation or has been graded, so a correction is
    /// always validated against the grid it was scored with.
    pub async fn set_grading_grid(
        &self,
        actor: &ActorContext,
        contest_id: Uuid,
        grid: Option<GradingGrid>,
    ) -> AppResult<Contest> {
        actor.require_admin()?;
        if let Some(grid) = &grid {
            validate_grading_grid(grid).map_err(AppError::Validation)?;
        }

        let contest = self
            .store
            .update_grading_grid(contest_id, grid.as_ref())
            .await?;

        let total = contest.grid().map(GradingGrid::total);
        tracing::info!(contest_id = %contest_id, grid_total = ?total, "Grading grid changed");
        self.audit
            .record(
                actor,
                AuditAction::GridChanged,
                match total {
                    Some(total) => format!("contest {} grid total {}", contest_id, total),
                    None => format!("contest {} grid removed", contest_id),
                },
            )
            .await;

        Ok(contest)
    }

    pub async fn set_status(
        &self,
        actor: &ActorContext,
        contest_id: Uuid,
        status: ContestStatus,
    ) -> AppResult<Contest> {
        actor.require_admin()?;
        let contest = self.store.update_contest_status(contest_id, status).await?;
        tracing::info!(contest_id = %contest_id, status = %status, "Contest status changed");
        Ok(contest)
    }

    /// Per-status counts and score spread of a contest
    pub async fn statistics(
        &self,
        actor: &ActorContext,
        contest_id: Uuid,
    ) -> AppResult<ContestStatistics> {
        actor.require_admin()?;
        self.get_contest(contest_id).await?;

        let submissions = self.store.list_submissions(contest_id).await?;
        Ok(ContestStatistics::from_submissions(contest_id, &submissions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Criterion;
    use chrono::{Duration, Utc};

    fn service() -> ContestService {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLog::new(store.clone()));
        ContestService::new(store, audit)
    }

    fn new_contest(title: &str) -> NewContest {
        let now = Utc::now();
        NewContest {
            title: title.to_string(),
            description: Some("Session de printemps".to_string()),
            opens_at: now,
            closes_at: now + Duration::days(7),
            grading_grid: Some(GradingGrid::new(vec![Criterion::new("criterion1", 10.0)])),
        }
    }

    #[tokio::test]
    async fn test_create_contest_starts_as_draft() {
        let service = service();
        let admin = ActorContext::admin(Uuid::new_v4());

        let contest = service
            .create_contest(&admin, new_contest("  Concours 2026  "))
            .await
            .unwrap();
        assert_eq!(contest.title, "Concours 2026");
        assert_eq!(contest.status, ContestStatus::Draft);
        assert_eq!(contest.grid().map(GradingGrid::total), Some(10.0));
    }

    #[tokio::test]
    async fn test_contest_title_is_unique() {
        let service = service();
        let admin = ActorContext::admin(Uuid::new_v4());
        service
            .create_contest(&admin, new_contest("Concours"))
            .await
            .unwrap();

        let err = service
            .create_contest(&admin, new_contest("Concours"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_rejects_inverted_window_and_bad_grid() {
        let service = service();
        let admin = ActorContext::admin(Uuid::new_v4());

        let mut inverted = new_contest("Inverted");
        std::mem::swap(&mut inverted.opens_at, &mut inverted.closes_at);
        assert!(matches!(
            service.create_contest(&admin, inverted).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_grid = new_contest("Bad grid");
        bad_grid.grading_grid = Some(GradingGrid::new(vec![Criterion::new("c", -1.0)]));
        assert!(matches!(
            service.create_contest(&admin, bad_grid).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_grid_can_change_while_nothing_is_scored() {
        let service = service();
        let admin = ActorContext::admin(Uuid::new_v4());
        let contest = service
            .create_contest(&admin, new_contest("Concours"))
            .await
            .unwrap();

        let grid = GradingGrid::new(vec![
            Criterion::new("criterion1", 10.0),
            Criterion::new("criterion2", 10.0),
        ]);
        let updated = service
            .set_grading_grid(&admin, contest.id, Some(grid))
            .await
            .unwrap();
        assert_eq!(updated.grid().map(GradingGrid::total), Some(20.0));

        let removed = service
            .set_grading_grid(&admin, contest.id, None)
            .await
            .unwrap();
        assert!(removed.grid().is_none());
    }

    #[tokio::test]
    async fn test_status_change_requires_admin() {
        let service = service();
        let admin = ActorContext::admin(Uuid::new_v4());
        let contest = service
            .create_contest(&admin, new_contest("Concours"))
            .await
            .unwrap();

        let candidate = ActorContext::candidate(Uuid::new_v4());
        assert!(service
            .set_status(&candidate, contest.id, ContestStatus::Open)
            .await
            .is_err());

        let opened = service
            .set_status(&admin, contest.id, ContestStatus::Open)
            .await
            .unwrap();
        assert_eq!(opened.status, ContestStatus::Open);
    }
}
