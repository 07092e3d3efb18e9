//! In-process store
//!
//! Holds every table behind one mutex so each [`Store`] call is a single
//! critical section, mirroring the transactional guarantees of the Postgres
//! store. Used by tests and by `STORE_BACKEND=memory` deployments.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Attribution, AuditEntry, Contest, ContestStatus, Correction, CorrectionApproval,
        CorrectionStatus, FileReplacement, GradingGrid, ModificationRecord, NewAttribution,
        NewAuditEntry, NewContest, NewCorrection, NewRejection, NewSubmission, Reattribution,
        RejectionKind, RejectionRecord, Submission, SubmissionStatus,
    },
};

use super::store::{AuditSink, Store};

#[derive(Default)]
struct Tables {
    contests: Vec<Contest>,
    submissions: HashMap<Uuid, Submission>,
    modifications: Vec<ModificationRecord>,
    /// Keyed by submission id: at most one attribution per submission
    attributions: HashMap<Uuid, Attribution>,
    corrections: Vec<Correction>,
    rejections: Vec<RejectionRecord>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn submission_mut(&mut self, id: Uuid) -> AppResult<&mut Submission> {
        self.submissions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    fn contest_mut(&mut self, id: Uuid) -> AppResult<&mut Contest> {
        self.contests
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }

    fn retire_revision_requests(&mut self, submission_id: Uuid) {
        let now = Utc::now();
        for correction in self.corrections.iter_mut().filter(|c| {
            c.submission_id == submission_id
                && c.is_current()
                && c.status == CorrectionStatus::RevisionRequested
        }) {
            correction.retired_at = Some(now);
        }
    }

    /// Check that a correction is still awaiting an admin decision
    fn pending_correction_index(&self, correction_id: Uuid) -> AppResult<usize> {
        let index = self
            .corrections
            .iter()
            .position(|c| c.id == correction_id)
            .ok_or_else(|| AppError::NotFound("Correction not found".to_string()))?;

        let correction = &self.corrections[index];
        match correction.status {
            CorrectionStatus::Pending if correction.is_current() => Ok(index),
            CorrectionStatus::Pending => Err(AppError::ConcurrentModification {
                subject: format!("correction {}", correction_id),
            }),
            CorrectionStatus::Validated => Err(AppError::AlreadyValidated { correction_id }),
            status => Err(AppError::AlreadyRejected {
                correction_id,
                status,
            }),
        }
    }

    fn expect_submitted(&self, submission_id: Uuid) -> AppResult<()> {
        match self.submissions.get(&submission_id) {
            Some(s) if s.status == SubmissionStatus::CorrectionSubmitted => Ok(()),
            Some(_) => Err(AppError::ConcurrentModification {
                subject: format!("submission {}", submission_id),
            }),
            None => Err(AppError::NotFound("Submission not found".to_string())),
        }
    }
}

/// Store keeping all records in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a half-applied write:
        // every method validates before mutating.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_contest(&self, contest: &NewContest) -> AppResult<Contest> {
        let mut tables = self.tables();
        if tables.contests.iter().any(|c| c.title == contest.title) {
            return Err(AppError::AlreadyExists(format!(
                "Contest '{}' already exists",
                contest.title
            )));
        }

        let now = Utc::now();
        let created = Contest {
            id: Uuid::new_v4(),
            title: contest.title.clone(),
            description: contest.description.clone(),
            opens_at: contest.opens_at,
            closes_at: contest.closes_at,
            grading_grid: contest.grading_grid.clone().map(Json),
            status: ContestStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        tables.contests.push(created.clone());
        Ok(created)
    }

    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>> {
        Ok(self.tables().contests.iter().find(|c| c.id == id).cloned())
    }

    async fn list_contests(&self) -> AppResult<Vec<Contest>> {
        let mut contests = self.tables().contests.clone();
        contests.sort_by(|a, b| b.opens_at.cmp(&a.opens_at));
        Ok(contests)
    }

    async fn update_grading_grid(
        &self,
        contest_id: Uuid,
        grid: Option<&GradingGrid>,
    ) -> AppResult<Contest> {
        let mut tables = self.tables();
        let scored = tables
            .submissions
            .values()
            .any(|s| s.contest_id == contest_id && s.status.has_scored_correction());

        let contest = tables.contest_mut(contest_id)?;
        if scored {
            return Err(AppError::GridLocked { contest_id });
        }
        contest.grading_grid = grid.cloned().map(Json);
        contest.updated_at = Utc::now();
        Ok(contest.clone())
    }

    async fn update_contest_status(
        &self,
        contest_id: Uuid,
        status: ContestStatus,
    ) -> AppResult<Contest> {
        let mut tables = self.tables();
        let contest = tables.contest_mut(contest_id)?;
        contest.status = status;
        contest.updated_at = Utc::now();
        Ok(contest.clone())
    }

    async fn anonymous_id_exists(&self, anonymous_id: &str) -> AppResult<bool> {
        Ok(self
            .tables()
            .submissions
            .values()
            .any(|s| s.anonymous_id == anonymous_id))
    }

    async fn create_submission(&self, submission: &NewSubmission) -> AppResult<Submission> {
        let mut tables = self.tables();
        if !tables.contests.iter().any(|c| c.id == submission.contest_id) {
            return Err(AppError::NotFound("Contest not found".to_string()));
        }
        if tables
            .submissions
            .values()
            .any(|s| s.anonymous_id == submission.anonymous_id)
        {
            return Err(AppError::ConcurrentModification {
                subject: "anonymous identifier".to_string(),
            });
        }
        if tables.submissions.values().any(|s| {
            s.contest_id == submission.contest_id && s.candidate_id == submission.candidate_id
        }) {
            return Err(AppError::AlreadyExists(
                "Candidate already has a submission for this contest".to_string(),
            ));
        }

        let created = Submission {
            id: Uuid::new_v4(),
            anonymous_id: submission.anonymous_id.clone(),
            encrypted_path: submission.encrypted_path.clone(),
            contest_id: submission.contest_id,
            candidate_id: submission.candidate_id,
            status: SubmissionStatus::Pending,
            final_score: None,
            deposited_at: submission.deposited_at,
            updated_at: submission.deposited_at,
        };
        tables.submissions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        Ok(self.tables().submissions.get(&id).cloned())
    }

    async fn list_submissions(&self, contest_id: Uuid) -> AppResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .tables()
            .submissions
            .values()
            .filter(|s| s.contest_id == contest_id)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| a.deposited_at.cmp(&b.deposited_at));
        Ok(submissions)
    }

    async fn replace_submission_file(
        &self,
        replacement: &FileReplacement,
    ) -> AppResult<(Submission, ModificationRecord)> {
        let mut tables = self.tables();
        let submission = tables.submission_mut(replacement.submission_id)?;
        if !submission.status.allows_file_replacement() {
            return Err(AppError::LockedSubmission {
                submission_id: submission.id,
                status: submission.status,
            });
        }

        let record = ModificationRecord {
            id: Uuid::new_v4(),
            submission_id: submission.id,
            previous_encrypted_path: submission.encrypted_path.clone(),
            new_encrypted_path: replacement.new_encrypted_path.clone(),
            reason: replacement.reason.clone(),
            modified_by: replacement.modified_by,
            modified_at: replacement.modified_at,
        };
        submission.encrypted_path = replacement.new_encrypted_path.clone();
        submission.updated_at = replacement.modified_at;
        let updated = submission.clone();

        tables.modifications.push(record.clone());
        Ok((updated, record))
    }

    async fn list_modifications(&self, submission_id: Uuid) -> AppResult<Vec<ModificationRecord>> {
        Ok(self
            .tables()
            .modifications
            .iter()
            .filter(|m| m.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn create_attribution(&self, attribution: &NewAttribution) -> AppResult<Attribution> {
        let mut tables = self.tables();
        if let Some(existing) = tables.attributions.get(&attribution.submission_id) {
            return Err(AppError::AlreadyAttributed {
                submission_id: attribution.submission_id,
                corrector_id: existing.corrector_id,
            });
        }

        let submission = tables.submission_mut(attribution.submission_id)?;
        if submission.status == SubmissionStatus::Pending {
            submission.status = SubmissionStatus::InCorrection;
            submission.updated_at = attribution.assigned_at;
        }

        let created = Attribution {
            id: Uuid::new_v4(),
            submission_id: attribution.submission_id,
            corrector_id: attribution.corrector_id,
            assigned_by: attribution.assigned_by,
            assigned_at: attribution.assigned_at,
        };
        tables
            .attributions
            .insert(created.submission_id, created.clone());
        Ok(created)
    }

    async fn replace_attribution(&self, attribution: &NewAttribution) -> AppResult<Reattribution> {
        let mut tables = self.tables();
        let submission = tables.submission_mut(attribution.submission_id)?;
        if !submission.status.allows_file_replacement() {
            return Err(AppError::LockedSubmission {
                submission_id: submission.id,
                status: submission.status,
            });
        }
        submission.status = SubmissionStatus::InCorrection;
        submission.updated_at = attribution.assigned_at;

        let current = Attribution {
            id: Uuid::new_v4(),
            submission_id: attribution.submission_id,
            corrector_id: attribution.corrector_id,
            assigned_by: attribution.assigned_by,
            assigned_at: attribution.assigned_at,
        };
        let previous = tables
            .attributions
            .remove(&attribution.submission_id)
            .ok_or_else(|| AppError::NotFound("Submission has no attribution".to_string()));
        let previous = match previous {
            Ok(previous) => previous,
            Err(e) => {
                // Nothing was attributed: undo the status change above.
                let submission = tables.submission_mut(attribution.submission_id)?;
                submission.status = SubmissionStatus::Pending;
                return Err(e);
            }
        };

        tables.retire_revision_requests(attribution.submission_id);
        tables
            .attributions
            .insert(current.submission_id, current.clone());
        Ok(Reattribution { previous, current })
    }

    async fn delete_attribution(&self, submission_id: Uuid) -> AppResult<Option<Attribution>> {
        let mut tables = self.tables();
        let submission = tables.submission_mut(submission_id)?;
        if !submission.status.allows_file_replacement() {
            return Err(AppError::LockedSubmission {
                submission_id,
                status: submission.status,
            });
        }

        let Some(removed) = tables.attributions.remove(&submission_id) else {
            return Ok(None);
        };
        tables.retire_revision_requests(submission_id);
        let submission = tables.submission_mut(submission_id)?;
        submission.status = SubmissionStatus::Pending;
        submission.updated_at = Utc::now();
        Ok(Some(removed))
    }

    async fn find_attribution(&self, submission_id: Uuid) -> AppResult<Option<Attribution>> {
        Ok(self.tables().attributions.get(&submission_id).cloned())
    }

    async fn list_awaiting_correction(&self, corrector_id: Uuid) -> AppResult<Vec<Attribution>> {
        let tables = self.tables();
        let mut awaiting: Vec<Attribution> = tables
            .attributions
            .values()
            .filter(|a| a.corrector_id == corrector_id)
            .filter(|a| {
                !tables.corrections.iter().any(|c| {
                    c.submission_id == a.submission_id
                        && c.corrector_id == corrector_id
                        && c.is_current()
                        && matches!(
                            c.status,
                            CorrectionStatus::Pending | CorrectionStatus::Validated
                        )
                })
            })
            .cloned()
            .collect();
        awaiting.sort_by(|a, b| a.assigned_at.cmp(&b.assigned_at));
        Ok(awaiting)
    }

    async fn submit_correction(&self, correction: &NewCorrection) -> AppResult<Correction> {
        let mut tables = self.tables();
        let conflict = || AppError::ConcurrentModification {
            subject: format!("correction of submission {}", correction.submission_id),
        };

        let submission = tables
            .submissions
            .get(&correction.submission_id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
        if submission.status != SubmissionStatus::InCorrection {
            return Err(conflict());
        }
        let grid_unchanged = tables
            .contests
            .iter()
            .find(|c| c.id == submission.contest_id)
            .is_some_and(|c| c.grid() == correction.scored_against.as_ref());
        if !grid_unchanged {
            return Err(conflict());
        }
        match tables.attributions.get(&correction.submission_id) {
            Some(a) if a.corrector_id == correction.corrector_id => {}
            _ => return Err(conflict()),
        }

        let existing = tables.corrections.iter().position(|c| {
            c.submission_id == correction.submission_id
                && c.corrector_id == correction.corrector_id
                && c.is_current()
        });

        let stored = match existing {
            Some(index)
                if tables.corrections[index].status == CorrectionStatus::RevisionRequested =>
            {
                let revised = &mut tables.corrections[index];
                revised.evaluation_json = correction.evaluation_json.clone();
                revised.status = CorrectionStatus::Pending;
                revised.submitted_at = correction.submitted_at;
                revised.admin_comment = None;
                revised.clone()
            }
            Some(_) => return Err(conflict()),
            None => {
                let created = Correction {
                    id: Uuid::new_v4(),
                    submission_id: correction.submission_id,
                    corrector_id: correction.corrector_id,
                    evaluation_json: correction.evaluation_json.clone(),
                    status: CorrectionStatus::Pending,
                    submitted_at: correction.submitted_at,
                    admin_comment: None,
                    validated_by: None,
                    validated_at: None,
                    retired_at: None,
                };
                tables.corrections.push(created.clone());
                created
            }
        };

        let submission = tables.submission_mut(correction.submission_id)?;
        submission.status = SubmissionStatus::CorrectionSubmitted;
        submission.updated_at = correction.submitted_at;
        Ok(stored)
    }

    async fn find_correction(&self, id: Uuid) -> AppResult<Option<Correction>> {
        Ok(self
            .tables()
            .corrections
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_corrections(&self, submission_id: Uuid) -> AppResult<Vec<Correction>> {
        let mut corrections: Vec<Correction> = self
            .tables()
            .corrections
            .iter()
            .filter(|c| c.submission_id == submission_id)
            .cloned()
            .collect();
        corrections.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(corrections)
    }

    async fn validate_correction(
        &self,
        approval: &CorrectionApproval,
    ) -> AppResult<(Correction, Submission)> {
        let mut tables = self.tables();
        let index = tables.pending_correction_index(approval.correction_id)?;
        let submission_id = tables.corrections[index].submission_id;
        tables.expect_submitted(submission_id)?;

        let correction = &mut tables.corrections[index];
        correction.status = CorrectionStatus::Validated;
        correction.validated_by = Some(approval.validated_by);
        correction.validated_at = Some(approval.validated_at);
        let correction = correction.clone();

        let submission = tables.submission_mut(submission_id)?;
        submission.status = SubmissionStatus::Graded;
        submission.final_score = Some(approval.final_score);
        submission.updated_at = approval.validated_at;
        let submission = submission.clone();

        Ok((correction, submission))
    }

    async fn reject_correction(&self, rejection: &NewRejection) -> AppResult<RejectionRecord> {
        let mut tables = self.tables();
        let index = tables.pending_correction_index(rejection.correction_id)?;
        let submission_id = tables.corrections[index].submission_id;
        tables.expect_submitted(submission_id)?;

        let correction = &mut tables.corrections[index];
        let record = RejectionRecord {
            id: Uuid::new_v4(),
            correction_id: correction.id,
            submission_id,
            corrector_id: correction.corrector_id,
            kind: rejection.kind,
            evaluation_json: correction.evaluation_json.clone(),
            score: rejection.score,
            comment: rejection.comment.clone(),
            rejected_by: rejection.rejected_by,
            rejected_at: rejection.rejected_at,
        };

        correction.admin_comment = Some(rejection.comment.clone());
        match rejection.kind {
            RejectionKind::Rejected => {
                correction.status = CorrectionStatus::Rejected;
                correction.retired_at = Some(rejection.rejected_at);
            }
            RejectionKind::RevisionRequested => {
                correction.status = CorrectionStatus::RevisionRequested;
            }
        }

        let submission = tables.submission_mut(submission_id)?;
        submission.status = SubmissionStatus::InCorrection;
        submission.updated_at = rejection.rejected_at;

        tables.rejections.push(record.clone());
        Ok(record)
    }

    async fn list_rejections(&self, submission_id: Uuid) -> AppResult<Vec<RejectionRecord>> {
        Ok(self
            .tables()
            .rejections
            .iter()
            .filter(|r| r.submission_id == submission_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        let stored = AuditEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action,
            subject: entry.subject.clone(),
            recorded_at: entry.recorded_at,
        };
        self.tables().audit.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .tables()
            .audit
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
