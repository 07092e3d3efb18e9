//! Correction workflow
//!
//! Drives a submission from attribution to a final grade:
//!
//! ```text
//! pending --assign--> in_correction --submit--> correction_submitted --validate--> graded
//!                          ^                              |
//!                          +------ reject / revision -----+
//! ```
//!
//! Every transition is a single store call. The checks done here only pick
//! the right error early; the store re-checks under its own atomicity and
//! has the final word when two requests race.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        ActorContext, AuditAction, Contest, Correction, CorrectionApproval, CorrectionStatus,
        NewCorrection, NewRejection, RejectionKind, RejectionRecord, Role, Submission,
        SubmissionStatus,
    },
    utils::validation::normalize_comment,
};

use super::{
    AuditLog,
    grading::{GradeCalculator, ScoreBreakdown},
};

/// Display score of a correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayScore {
    pub points: f64,
    pub max_points: Option<f64>,
    pub normalized: Option<f64>,
}

/// A correction with its score recomputed against the current grid
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionView {
    pub correction: Correction,
    pub anonymous_id: String,
    pub score: Option<DisplayScore>,
    /// Why the stored evaluation no longer scores, e.g. after a grid change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_error: Option<String>,
}

/// Result of an admin validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedCorrection {
    pub correction: Correction,
    pub submission: Submission,
}

/// The correction state machine
pub struct CorrectionWorkflow {
    store: Arc<dyn Store>,
    audit: Arc<AuditLog>,
    grading_scale: f64,
}

impl CorrectionWorkflow {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditLog>, grading_scale: f64) -> Self {
        Self {
            store,
            audit,
            grading_scale,
        }
    }

    /// Submit the attributed corrector's evaluation.
    ///
    /// The evaluation is scored before anything is written; an invalid one
    /// leaves the submission in `in_correction` with nothing persisted.
    pub async fn submit_evaluation(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
        raw_evaluation: &str,
    ) -> AppResult<CorrectionView> {
        actor.require_role(Role::Corrector)?;

        let submission = self.find_submission(submission_id).await?;
        let attributed = self
            .store
            .find_attribution(submission_id)
            .await?
            .is_some_and(|a| a.corrector_id == actor.actor_id);
        if !attributed {
            return Err(AppError::Forbidden(
                "Submission is not attributed to you".to_string(),
            ));
        }

        match submission.status {
            SubmissionStatus::InCorrection => {}
            SubmissionStatus::CorrectionSubmitted => {
                return Err(AppError::ConcurrentModification {
                    subject: format!("correction of submission {}", submission_id),
                });
            }
            status => {
                return Err(AppError::LockedSubmission {
                    submission_id,
                    status,
                });
            }
        }

        let contest = self.find_contest(&submission).await?;
        let score = GradeCalculator::compute_final_score(raw_evaluation, contest.grid())?;

        let correction = self
            .store
            .submit_correction(&NewCorrection {
                submission_id,
                corrector_id: actor.actor_id,
                evaluation_json: raw_evaluation.to_string(),
                submitted_at: Utc::now(),
                scored_against: contest.grid().cloned(),
            })
            .await?;

        tracing::info!(
            submission_id = %submission_id,
            correction_id = %correction.id,
            corrector_id = %actor.actor_id,
            points = score.points,
            "Correction submitted"
        );
        self.audit
            .record(
                actor,
                AuditAction::CorrectionSubmitted,
                format!(
                    "correction {} of submission {}",
                    correction.id, submission.anonymous_id
                ),
            )
            .await;

        Ok(CorrectionView {
            correction,
            anonymous_id: submission.anonymous_id,
            score: Some(self.display(score)),
            score_error: None,
        })
    }

    /// Approve a pending correction and grade its submission.
    ///
    /// The score is recomputed against the contest's grid, which cannot
    /// change while the correction awaits a decision. A second validation
    /// fails with `AlreadyValidated` and leaves the final score untouched.
    pub async fn validate(
        &self,
        actor: &ActorContext,
        correction_id: Uuid,
    ) -> AppResult<ValidatedCorrection> {
        actor.require_admin()?;

        let correction = self.find_correction(correction_id).await?;
        ensure_awaiting_decision(&correction)?;

        let submission = self.find_submission(correction.submission_id).await?;
        let contest = self.find_contest(&submission).await?;
        let score =
            GradeCalculator::compute_final_score(&correction.evaluation_json, contest.grid())?;

        let (correction, submission) = self
            .store
            .validate_correction(&CorrectionApproval {
                correction_id,
                validated_by: actor.actor_id,
                validated_at: Utc::now(),
                final_score: score.points,
            })
            .await?;

        tracing::info!(
            submission_id = %submission.id,
            correction_id = %correction_id,
            final_score = score.points,
            "Correction validated"
        );
        self.audit
            .record(
                actor,
                AuditAction::CorrectionValidated,
                format!(
                    "correction {} of submission {}",
                    correction_id, submission.anonymous_id
                ),
            )
            .await;

        Ok(ValidatedCorrection {
            correction,
            submission,
        })
    }

    /// Reject a pending correction. The evaluation is kept in a rejection
    /// record and the submission goes back to `in_correction`.
    pub async fn reject(
        &self,
        actor: &ActorContext,
        correction_id: Uuid,
        comment: &str,
    ) -> AppResult<RejectionRecord> {
        self.refuse(actor, correction_id, comment, RejectionKind::Rejected)
            .await
    }

    /// Send a pending correction back to its corrector for changes.
    ///
    /// Unlike [`reject`](Self::reject) the correction stays current; the
    /// corrector's next submission overwrites it in place.
    pub async fn request_revision(
        &self,
        actor: &ActorContext,
        correction_id: Uuid,
        comment: &str,
    ) -> AppResult<RejectionRecord> {
        self.refuse(actor, correction_id, comment, RejectionKind::RevisionRequested)
            .await
    }

    async fn refuse(
        &self,
        actor: &ActorContext,
        correction_id: Uuid,
        comment: &str,
        kind: RejectionKind,
    ) -> AppResult<RejectionRecord> {
        actor.require_admin()?;
        let comment = normalize_comment(comment)
            .map_err(|e| AppError::Validation(e.to_string()))?
            .ok_or(AppError::MissingComment)?;

        let correction = self.find_correction(correction_id).await?;
        ensure_awaiting_decision(&correction)?;

        let submission = self.find_submission(correction.submission_id).await?;
        let contest = self.find_contest(&submission).await?;
        let score =
            GradeCalculator::compute_final_score(&correction.evaluation_json, contest.grid())
                .ok()
                .map(|s| s.points);

        let record = self
            .store
            .reject_correction(&NewRejection {
                correction_id,
                kind,
                score,
                comment,
                rejected_by: actor.actor_id,
                rejected_at: Utc::now(),
            })
            .await?;

        let action = match kind {
            RejectionKind::Rejected => AuditAction::CorrectionRejected,
            RejectionKind::RevisionRequested => AuditAction::RevisionRequested,
        };
        tracing::info!(
            submission_id = %submission.id,
            correction_id = %correction_id,
            kind = %kind.as_str(),
            "Correction refused"
        );
        self.audit
            .record(
                actor,
                action,
                format!(
                    "correction {} of submission {}",
                    correction_id, submission.anonymous_id
                ),
            )
            .await;

        Ok(record)
    }

    /// A correction with its display score, for admins and its corrector
    pub async fn get_correction(
        &self,
        actor: &ActorContext,
        correction_id: Uuid,
    ) -> AppResult<CorrectionView> {
        let correction = self.find_correction(correction_id).await?;
        if !actor.is_admin() && correction.corrector_id != actor.actor_id {
            return Err(AppError::Forbidden(
                "No access to this correction".to_string(),
            ));
        }

        let submission = self.find_submission(correction.submission_id).await?;
        let contest = self.find_contest(&submission).await?;
        let scored =
            GradeCalculator::compute_final_score(&correction.evaluation_json, contest.grid());
        let (score, score_error) = match scored {
            Ok(score) => (Some(self.display(score)), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Ok(CorrectionView {
            correction,
            anonymous_id: submission.anonymous_id,
            score,
            score_error,
        })
    }

    fn display(&self, score: ScoreBreakdown) -> DisplayScore {
        DisplayScore {
            points: score.points,
            max_points: score.max_points,
            normalized: score.normalized(self.grading_scale),
        }
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Submission> {
        self.store
            .find_submission(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    async fn find_correction(&self, id: Uuid) -> AppResult<Correction> {
        self.store
            .find_correction(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Correction not found".to_string()))
    }

    async fn find_contest(&self, submission: &Submission) -> AppResult<Contest> {
        self.store
            .find_contest(submission.contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }
}

fn ensure_awaiting_decision(correction: &Correction) -> AppResult<()> {
    match correction.status {
        CorrectionStatus::Pending => Ok(()),
        CorrectionStatus::Validated => Err(AppError::AlreadyValidated {
            correction_id: correction.id,
        }),
        status => Err(AppError::AlreadyRejected {
            correction_id: correction.id,
            status,
        }),
    }
}
