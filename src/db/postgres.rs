//! Postgres store
//!
//! Each [`Store`] method runs in one transaction. Rows that decide a state
//! transition are locked with `SELECT ... FOR UPDATE` before they are checked,
//! and the unique constraints of the schema catch whatever slips past.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Attribution, AuditEntry, Contest, ContestStatus, Correction, CorrectionApproval,
        CorrectionStatus, FileReplacement, GradingGrid, ModificationRecord, NewAttribution,
        NewAuditEntry, NewContest, NewCorrection, NewRejection, NewSubmission, Reattribution,
        RejectionRecord, Submission, SubmissionStatus,
    },
};

use super::{
    repositories::{
        AttributionRepository, AuditRepository, ContestRepository, CorrectionRepository,
        SubmissionRepository,
    },
    store::{AuditSink, Store},
};

/// Store backed by a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn submission_not_found() -> AppError {
    AppError::NotFound("Submission not found".to_string())
}

fn locked(submission: &Submission) -> AppError {
    AppError::LockedSubmission {
        submission_id: submission.id,
        status: submission.status,
    }
}

/// Check that a locked correction is still awaiting an admin decision
fn ensure_pending(correction: &Correction) -> AppResult<()> {
    match correction.status {
        CorrectionStatus::Pending if correction.is_current() => Ok(()),
        CorrectionStatus::Pending => Err(AppError::ConcurrentModification {
            subject: format!("correction {}", correction.id),
        }),
        CorrectionStatus::Validated => Err(AppError::AlreadyValidated {
            correction_id: correction.id,
        }),
        status => Err(AppError::AlreadyRejected {
            correction_id: correction.id,
            status,
        }),
    }
}

fn ensure_submitted(submission: &Submission) -> AppResult<()> {
    if submission.status == SubmissionStatus::CorrectionSubmitted {
        Ok(())
    } else {
        Err(AppError::ConcurrentModification {
            subject: format!("submission {}", submission.id),
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_contest(&self, contest: &NewContest) -> AppResult<Contest> {
        ContestRepository::create(&self.pool, contest).await
    }

    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>> {
        ContestRepository::find_by_id(&self.pool, &id).await
    }

    async fn list_contests(&self) -> AppResult<Vec<Contest>> {
        ContestRepository::list(&self.pool).await
    }

    async fn update_grading_grid(
        &self,
        contest_id: Uuid,
        grid: Option<&GradingGrid>,
    ) -> AppResult<Contest> {
        let mut tx = self.pool.begin().await?;

        ContestRepository::find_for_update(&mut *tx, &contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

        if SubmissionRepository::contest_has_scored_corrections(&mut *tx, &contest_id).await? {
            return Err(AppError::GridLocked { contest_id });
        }

        let contest = ContestRepository::update_grid(&mut *tx, &contest_id, grid).await?;
        tx.commit().await?;

        Ok(contest)
    }

    async fn update_contest_status(
        &self,
        contest_id: Uuid,
        status: ContestStatus,
    ) -> AppResult<Contest> {
        ContestRepository::update_status(&self.pool, &contest_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }

    async fn anonymous_id_exists(&self, anonymous_id: &str) -> AppResult<bool> {
        SubmissionRepository::anonymous_id_exists(&self.pool, anonymous_id).await
    }

    async fn create_submission(&self, submission: &NewSubmission) -> AppResult<Submission> {
        // Constraint violations map to ConcurrentModification / AlreadyExists
        SubmissionRepository::create(&self.pool, submission).await
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        SubmissionRepository::find_by_id(&self.pool, &id).await
    }

    async fn list_submissions(&self, contest_id: Uuid) -> AppResult<Vec<Submission>> {
        SubmissionRepository::list_by_contest(&self.pool, &contest_id).await
    }

    async fn replace_submission_file(
        &self,
        replacement: &FileReplacement,
    ) -> AppResult<(Submission, ModificationRecord)> {
        let mut tx = self.pool.begin().await?;

        let current = SubmissionRepository::find_for_update(&mut *tx, &replacement.submission_id)
            .await?
            .ok_or_else(submission_not_found)?;
        if !current.status.allows_file_replacement() {
            return Err(locked(&current));
        }

        let record = SubmissionRepository::insert_modification(
            &mut *tx,
            &current.encrypted_path,
            replacement,
        )
        .await?;
        let submission = SubmissionRepository::update_file(&mut *tx, replacement).await?;
        tx.commit().await?;

        Ok((submission, record))
    }

    async fn list_modifications(&self, submission_id: Uuid) -> AppResult<Vec<ModificationRecord>> {
        SubmissionRepository::list_modifications(&self.pool, &submission_id).await
    }

    async fn create_attribution(&self, attribution: &NewAttribution) -> AppResult<Attribution> {
        let mut tx = self.pool.begin().await?;

        let submission =
            SubmissionRepository::find_for_update(&mut *tx, &attribution.submission_id)
                .await?
                .ok_or_else(submission_not_found)?;

        let Some(created) = AttributionRepository::insert_if_absent(&mut *tx, attribution).await?
        else {
            let existing =
                AttributionRepository::find_by_submission(&mut *tx, &attribution.submission_id)
                    .await?;
            return Err(match existing {
                Some(existing) => AppError::AlreadyAttributed {
                    submission_id: attribution.submission_id,
                    corrector_id: existing.corrector_id,
                },
                None => AppError::ConcurrentModification {
                    subject: "attribution".to_string(),
                },
            });
        };

        if submission.status == SubmissionStatus::Pending {
            SubmissionRepository::update_status(
                &mut *tx,
                &submission.id,
                SubmissionStatus::InCorrection,
                attribution.assigned_at,
            )
            .await?;
        }
        tx.commit().await?;

        Ok(created)
    }

    async fn replace_attribution(&self, attribution: &NewAttribution) -> AppResult<Reattribution> {
        let mut tx = self.pool.begin().await?;

        let submission =
            SubmissionRepository::find_for_update(&mut *tx, &attribution.submission_id)
                .await?
                .ok_or_else(submission_not_found)?;
        if !submission.status.allows_file_replacement() {
            return Err(locked(&submission));
        }

        let previous = AttributionRepository::delete_by_submission(&mut *tx, &submission.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission has no attribution".to_string()))?;
        CorrectionRepository::retire_revision_requests(
            &mut *tx,
            &submission.id,
            attribution.assigned_at,
        )
        .await?;

        let current = AttributionRepository::insert_if_absent(&mut *tx, attribution)
            .await?
            .ok_or_else(|| AppError::ConcurrentModification {
                subject: "attribution".to_string(),
            })?;

        if submission.status != SubmissionStatus::InCorrection {
            SubmissionRepository::update_status(
                &mut *tx,
                &submission.id,
                SubmissionStatus::InCorrection,
                attribution.assigned_at,
            )
            .await?;
        }
        tx.commit().await?;

        Ok(Reattribution { previous, current })
    }

    async fn delete_attribution(&self, submission_id: Uuid) -> AppResult<Option<Attribution>> {
        let mut tx = self.pool.begin().await?;

        let submission = SubmissionRepository::find_for_update(&mut *tx, &submission_id)
            .await?
            .ok_or_else(submission_not_found)?;
        if !submission.status.allows_file_replacement() {
            return Err(locked(&submission));
        }

        let Some(removed) =
            AttributionRepository::delete_by_submission(&mut *tx, &submission_id).await?
        else {
            return Ok(None);
        };

        let now = Utc::now();
        CorrectionRepository::retire_revision_requests(&mut *tx, &submission_id, now).await?;
        SubmissionRepository::update_status(
            &mut *tx,
            &submission_id,
            SubmissionStatus::Pending,
            now,
        )
        .await?;
        tx.commit().await?;

        Ok(Some(removed))
    }

    async fn find_attribution(&self, submission_id: Uuid) -> AppResult<Option<Attribution>> {
        AttributionRepository::find_by_submission(&self.pool, &submission_id).await
    }

    async fn list_awaiting_correction(&self, corrector_id: Uuid) -> AppResult<Vec<Attribution>> {
        AttributionRepository::list_awaiting(&self.pool, &corrector_id).await
    }

    async fn submit_correction(&self, correction: &NewCorrection) -> AppResult<Correction> {
        let conflict = || AppError::ConcurrentModification {
            subject: format!("correction of submission {}", correction.submission_id),
        };
        let mut tx = self.pool.begin().await?;

        // Contest first: a grid update holds it exclusively while it counts
        // scored submissions
        let contest =
            ContestRepository::find_for_share_by_submission(&mut *tx, &correction.submission_id)
                .await?
                .ok_or_else(submission_not_found)?;
        if contest.grid() != correction.scored_against.as_ref() {
            return Err(conflict());
        }

        let submission =
            SubmissionRepository::find_for_update(&mut *tx, &correction.submission_id)
                .await?
                .ok_or_else(submission_not_found)?;
        if submission.status != SubmissionStatus::InCorrection {
            return Err(conflict());
        }

        match AttributionRepository::find_by_submission(&mut *tx, &submission.id).await? {
            Some(a) if a.corrector_id == correction.corrector_id => {}
            _ => return Err(conflict()),
        }

        let existing = CorrectionRepository::find_current_by_corrector(
            &mut *tx,
            &correction.submission_id,
            &correction.corrector_id,
        )
        .await?;

        let stored = match existing {
            Some(current) if current.status == CorrectionStatus::RevisionRequested => {
                CorrectionRepository::revise(&mut *tx, &current.id, correction)
                    .await?
                    .ok_or_else(conflict)?
            }
            Some(_) => return Err(conflict()),
            None => CorrectionRepository::create(&mut *tx, correction).await?,
        };

        SubmissionRepository::update_status(
            &mut *tx,
            &submission.id,
            SubmissionStatus::CorrectionSubmitted,
            correction.submitted_at,
        )
        .await?;
        tx.commit().await?;

        Ok(stored)
    }

    async fn find_correction(&self, id: Uuid) -> AppResult<Option<Correction>> {
        CorrectionRepository::find_by_id(&self.pool, &id).await
    }

    async fn list_corrections(&self, submission_id: Uuid) -> AppResult<Vec<Correction>> {
        CorrectionRepository::list_by_submission(&self.pool, &submission_id).await
    }

    async fn validate_correction(
        &self,
        approval: &CorrectionApproval,
    ) -> AppResult<(Correction, Submission)> {
        let mut tx = self.pool.begin().await?;

        let correction = CorrectionRepository::find_for_update(&mut *tx, &approval.correction_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Correction not found".to_string()))?;
        ensure_pending(&correction)?;

        let submission = SubmissionRepository::find_for_update(&mut *tx, &correction.submission_id)
            .await?
            .ok_or_else(submission_not_found)?;
        ensure_submitted(&submission)?;

        let correction = CorrectionRepository::mark_validated(&mut *tx, approval).await?;
        let submission = SubmissionRepository::grade(
            &mut *tx,
            &submission.id,
            approval.final_score,
            approval.validated_at,
        )
        .await?;
        tx.commit().await?;

        Ok((correction, submission))
    }

    async fn reject_correction(&self, rejection: &NewRejection) -> AppResult<RejectionRecord> {
        let mut tx = self.pool.begin().await?;

        let correction = CorrectionRepository::find_for_update(&mut *tx, &rejection.correction_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Correction not found".to_string()))?;
        ensure_pending(&correction)?;

        let submission = SubmissionRepository::find_for_update(&mut *tx, &correction.submission_id)
            .await?
            .ok_or_else(submission_not_found)?;
        ensure_submitted(&submission)?;

        let record =
            CorrectionRepository::insert_rejection(&mut *tx, &correction, rejection).await?;
        CorrectionRepository::mark_refused(
            &mut *tx,
            &correction.id,
            rejection.kind,
            &rejection.comment,
            rejection.rejected_at,
        )
        .await?;
        SubmissionRepository::update_status(
            &mut *tx,
            &submission.id,
            SubmissionStatus::InCorrection,
            rejection.rejected_at,
        )
        .await?;
        tx.commit().await?;

        Ok(record)
    }

    async fn list_rejections(&self, submission_id: Uuid) -> AppResult<Vec<RejectionRecord>> {
        CorrectionRepository::list_rejections(&self.pool, &submission_id).await
    }
}

#[async_trait]
impl AuditSink for PgStore {
    async fn append(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        AuditRepository::insert(&self.pool, entry).await
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>> {
        AuditRepository::recent(&self.pool, limit).await
    }
}
