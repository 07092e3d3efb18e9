//! Attribution of submissions to correctors

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{ActorContext, Attribution, AuditAction, NewAttribution, Reattribution},
};

use super::AuditLog;

/// Assigns submissions to correctors, at most one corrector per submission
pub struct AttributionStore {
    store: Arc<dyn Store>,
    audit: Arc<AuditLog>,
}

impl AttributionStore {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditLog>) -> Self {
        Self { store, audit }
    }

    /// Attribute an unattributed submission.
    ///
    /// Fails with `AlreadyAttributed` when the submission already has a
    /// corrector; use [`reassign`](Self::reassign) to change it.
    pub async fn assign(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
        corrector_id: Uuid,
    ) -> AppResult<Attribution> {
        actor.require_admin()?;

        let attribution = self
            .store
            .create_attribution(&NewAttribution {
                submission_id,
                corrector_id,
                assigned_by: actor.actor_id,
                assigned_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            submission_id = %submission_id,
            corrector_id = %corrector_id,
            "Submission attributed"
        );
        self.audit
            .record(
                actor,
                AuditAction::Attributed,
                format!("submission {} to corrector {}", submission_id, corrector_id),
            )
            .await;

        Ok(attribution)
    }

    /// Replace the corrector of an attributed submission in one step
    pub async fn reassign(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
        new_corrector_id: Uuid,
    ) -> AppResult<Reattribution> {
        actor.require_admin()?;

        if let Some(current) = self.store.find_attribution(submission_id).await? {
            if current.corrector_id == new_corrector_id {
                return Err(AppError::Validation(
                    "Submission is already attributed to this corrector".to_string(),
                ));
            }
        }

        let reattribution = self
            .store
            .replace_attribution(&NewAttribution {
                submission_id,
                corrector_id: new_corrector_id,
                assigned_by: actor.actor_id,
                assigned_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            submission_id = %submission_id,
            previous_corrector_id = %reattribution.previous.corrector_id,
            corrector_id = %new_corrector_id,
            "Submission reattributed"
        );
        self.audit
            .record(
                actor,
                AuditAction::Reattributed,
                format!(
                    "submission {} from corrector {} to corrector {}",
                    submission_id, reattribution.previous.corrector_id, new_corrector_id
                ),
            )
            .await;

        Ok(reattribution)
    }

    /// Remove the attribution, returning the submission to `pending`.
    ///
    /// Returns `None` when the submission had no corrector.
    pub async fn unassign(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
    ) -> AppResult<Option<Attribution>> {
        actor.require_admin()?;

        let removed = self.store.delete_attribution(submission_id).await?;
        if let Some(removed) = &removed {
            tracing::info!(
                submission_id = %submission_id,
                corrector_id = %removed.corrector_id,
                "Submission unattributed"
            );
            self.audit
                .record(
                    actor,
                    AuditAction::Unattributed,
                    format!(
                        "submission {} from corrector {}",
                        submission_id, removed.corrector_id
                    ),
                )
                .await;
        }

        Ok(removed)
    }

    pub async fn find(&self, submission_id: Uuid) -> AppResult<Option<Attribution>> {
        self.store.find_attribution(submission_id).await
    }

    /// Copies a corrector still has to grade
    pub async fn awaiting_correction(
        &self,
        actor: &ActorContext,
        corrector_id: Uuid,
    ) -> AppResult<Vec<Attribution>> {
        if !actor.is_admin() && actor.actor_id != corrector_id {
            return Err(AppError::Forbidden(
                "Cannot list another corrector's copies".to_string(),
            ));
        }
        self.store.list_awaiting_correction(corrector_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewContest, NewSubmission, SubmissionStatus};
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        attributions: AttributionStore,
        admin: ActorContext,
        submission_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLog::new(store.clone()));
        let now = Utc::now();
        let contest = store
            .create_contest(&NewContest {
                title: "Concours interne".to_string(),
                description: None,
                opens_at: now - Duration::days(1),
                closes_at: now + Duration::days(1),
                grading_grid: None,
            })
            .await
            .unwrap();
        let submission = store
            .create_submission(&NewSubmission {
                anonymous_id: "ANO-0000-AAAAAAAAAAAA".to_string(),
                encrypted_path: "v1:k1:payload".to_string(),
                contest_id: contest.id,
                candidate_id: Uuid::new_v4(),
                deposited_at: now,
            })
            .await
            .unwrap();

        Fixture {
            attributions: AttributionStore::new(store.clone(), audit),
            store,
            admin: ActorContext::admin(Uuid::new_v4()),
            submission_id: submission.id,
        }
    }

    async fn status(fixture: &Fixture) -> SubmissionStatus {
        fixture
            .store
            .find_submission(fixture.submission_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_assign_moves_submission_into_correction() {
        let f = fixture().await;
        let corrector = Uuid::new_v4();

        let attribution = f
            .attributions
            .assign(&f.admin, f.submission_id, corrector)
            .await
            .unwrap();

        assert_eq!(attribution.corrector_id, corrector);
        assert_eq!(attribution.assigned_by, f.admin.actor_id);
        assert_eq!(status(&f).await, SubmissionStatus::InCorrection);
    }

    #[tokio::test]
    async fn test_second_assign_is_already_attributed() {
        let f = fixture().await;
        let first = Uuid::new_v4();
        f.attributions
            .assign(&f.admin, f.submission_id, first)
            .await
            .unwrap();

        let err = f
            .attributions
            .assign(&f.admin, f.submission_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::AlreadyAttributed { corrector_id, .. } if corrector_id == first
        ));
    }

    #[tokio::test]
    async fn test_at_most_one_attribution_through_any_sequence() {
        let f = fixture().await;
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        f.attributions.assign(&f.admin, f.submission_id, a).await.unwrap();
        let swap = f
            .attributions
            .reassign(&f.admin, f.submission_id, b)
            .await
            .unwrap();
        assert_eq!(swap.previous.corrector_id, a);
        assert_eq!(swap.current.corrector_id, b);

        let _ = f.attributions.assign(&f.admin, f.submission_id, c).await;
        let current = f.attributions.find(f.submission_id).await.unwrap().unwrap();
        assert_eq!(current.corrector_id, b);

        f.attributions.unassign(&f.admin, f.submission_id).await.unwrap();
        assert!(f.attributions.find(f.submission_id).await.unwrap().is_none());
        assert_eq!(status(&f).await, SubmissionStatus::Pending);

        f.attributions.assign(&f.admin, f.submission_id, c).await.unwrap();
        let current = f.attributions.find(f.submission_id).await.unwrap().unwrap();
        assert_eq!(current.corrector_id, c);
    }

    #[tokio::test]
    async fn test_reassign_is_audited_with_both_correctors() {
        let f = fixture().await;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        f.attributions.assign(&f.admin, f.submission_id, a).await.unwrap();
        f.attributions
            .reassign(&f.admin, f.submission_id, b)
            .await
            .unwrap();

        let entries = crate::db::AuditSink::recent(f.store.as_ref(), 10).await.unwrap();
        let reattributed = entries
            .iter()
            .find(|e| e.action == AuditAction::Reattributed)
            .unwrap();
        assert!(reattributed.subject.contains(&a.to_string()));
        assert!(reattributed.subject.contains(&b.to_string()));
    }

    #[tokio::test]
    async fn test_reassign_requires_existing_attribution() {
        let f = fixture().await;
        let err = f
            .attributions
            .reassign(&f.admin, f.submission_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_admins_attribute() {
        let f = fixture().await;
        let corrector = ActorContext::corrector(Uuid::new_v4());
        let err = f
            .attributions
            .assign(&corrector, f.submission_id, corrector.actor_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_awaiting_correction_lists_own_copies() {
        let f = fixture().await;
        let corrector = ActorContext::corrector(Uuid::new_v4());
        f.attributions
            .assign(&f.admin, f.submission_id, corrector.actor_id)
            .await
            .unwrap();

        let copies = f
            .attributions
            .awaiting_correction(&corrector, corrector.actor_id)
            .await
            .unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].submission_id, f.submission_id);

        let other = ActorContext::corrector(Uuid::new_v4());
        assert!(f
            .attributions
            .awaiting_correction(&other, corrector.actor_id)
            .await
            .is_err());
    }
}
