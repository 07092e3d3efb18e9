//! Persistence boundary
//!
//! Every method of [`Store`] is one atomic unit of work: either all of its
//! writes land or none do. Conflicting writes are detected by unique
//! constraints and conditional updates at write time, never by reading
//! first and deciding in process; losers get a domain error
//! (`AlreadyAttributed`, `ConcurrentModification`, `LockedSubmission`, ...)
//! instead of a half-applied state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Attribution, AuditEntry, Contest, ContestStatus, Correction, CorrectionApproval,
        FileReplacement, GradingGrid, ModificationRecord, NewAttribution, NewAuditEntry,
        NewContest, NewCorrection, NewRejection, NewSubmission, Reattribution, RejectionRecord,
        Submission,
    },
};

#[async_trait]
pub trait Store: Send + Sync {
    // ---------------------------------------------------------------- contests

    /// Insert a contest; a duplicate title fails with `AlreadyExists`
    async fn create_contest(&self, contest: &NewContest) -> AppResult<Contest>;

    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>>;

    async fn list_contests(&self) -> AppResult<Vec<Contest>>;

    /// Replace the grid unless a submission of the contest has a submitted
    /// or validated correction (`GridLocked`)
    async fn update_grading_grid(
        &self,
        contest_id: Uuid,
        grid: Option<&GradingGrid>,
    ) -> AppResult<Contest>;

    async fn update_contest_status(
        &self,
        contest_id: Uuid,
        status: ContestStatus,
    ) -> AppResult<Contest>;

    // ------------------------------------------------------------- submissions

    async fn anonymous_id_exists(&self, anonymous_id: &str) -> AppResult<bool>;

    /// Insert a submission in `pending`.
    ///
    /// A taken anonymous id fails with `ConcurrentModification` so the caller
    /// can mint another one; a second submission by the same candidate for
    /// the same contest fails with `AlreadyExists`.
    async fn create_submission(&self, submission: &NewSubmission) -> AppResult<Submission>;

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>>;

    async fn list_submissions(&self, contest_id: Uuid) -> AppResult<Vec<Submission>>;

    /// Swap the encrypted file reference while the submission is `pending`
    /// or `in_correction`, recording the old and new references. Any other
    /// status fails with `LockedSubmission` and writes nothing.
    async fn replace_submission_file(
        &self,
        replacement: &FileReplacement,
    ) -> AppResult<(Submission, ModificationRecord)>;

    async fn list_modifications(&self, submission_id: Uuid) -> AppResult<Vec<ModificationRecord>>;

    // ------------------------------------------------------------ attributions

    /// Insert the attribution and move a `pending` submission to
    /// `in_correction`. An existing attribution fails with
    /// `AlreadyAttributed`.
    async fn create_attribution(&self, attribution: &NewAttribution) -> AppResult<Attribution>;

    /// Remove the current attribution and insert the new one in a single
    /// unit. Only allowed while the submission is `pending` or
    /// `in_correction`; corrections the previous corrector had sent back for
    /// revision are retired.
    async fn replace_attribution(&self, attribution: &NewAttribution) -> AppResult<Reattribution>;

    /// Remove the attribution and return the submission to `pending`.
    async fn delete_attribution(&self, submission_id: Uuid) -> AppResult<Option<Attribution>>;

    async fn find_attribution(&self, submission_id: Uuid) -> AppResult<Option<Attribution>>;

    /// Attributions of `corrector_id` without a pending or validated
    /// current correction
    async fn list_awaiting_correction(&self, corrector_id: Uuid) -> AppResult<Vec<Attribution>>;

    // ------------------------------------------------------------- corrections

    /// Record a corrector's evaluation and move the submission from
    /// `in_correction` to `correction_submitted`.
    ///
    /// A current correction sent back for revision is updated in place;
    /// otherwise a new row is inserted. Losing the race on the submission
    /// status or the (submission, corrector) slot fails with
    /// `ConcurrentModification`, as does a grid that no longer matches
    /// `scored_against`.
    async fn submit_correction(&self, correction: &NewCorrection) -> AppResult<Correction>;

    async fn find_correction(&self, id: Uuid) -> AppResult<Option<Correction>>;

    async fn list_corrections(&self, submission_id: Uuid) -> AppResult<Vec<Correction>>;

    /// Mark a `pending` correction validated and grade its submission
    async fn validate_correction(
        &self,
        approval: &CorrectionApproval,
    ) -> AppResult<(Correction, Submission)>;

    /// Snapshot a `pending` correction into a rejection record, retire or
    /// flag it according to the rejection kind, and return the submission to
    /// `in_correction`
    async fn reject_correction(&self, rejection: &NewRejection) -> AppResult<RejectionRecord>;

    async fn list_rejections(&self, submission_id: Uuid) -> AppResult<Vec<RejectionRecord>>;
}

/// Append-only audit storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry>;

    async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>>;
}
