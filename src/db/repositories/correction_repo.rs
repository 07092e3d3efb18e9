//! Correction and rejection repository

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Correction, CorrectionApproval, CorrectionStatus, NewCorrection, NewRejection,
        RejectionKind, RejectionRecord,
    },
};

/// Repository for correction database operations
pub struct CorrectionRepository;

impl CorrectionRepository {
    /// Insert a new pending correction
    pub async fn create<'e, E: PgExecutor<'e>>(
        db: E,
        correction: &NewCorrection,
    ) -> AppResult<Correction> {
        let correction = sqlx::query_as::<_, Correction>(
            r#"
            INSERT INTO corrections
                (submission_id, corrector_id, evaluation_json, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(correction.submission_id)
        .bind(correction.corrector_id)
        .bind(&correction.evaluation_json)
        .bind(CorrectionStatus::Pending.as_str())
        .bind(correction.submitted_at)
        .fetch_one(db)
        .await?;

        Ok(correction)
    }

    /// Replace the evaluation of a correction sent back for revision
    pub async fn revise<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
        correction: &NewCorrection,
    ) -> AppResult<Option<Correction>> {
        let correction = sqlx::query_as::<_, Correction>(
            r#"
            UPDATE corrections
            SET evaluation_json = $2, status = $3, submitted_at = $4, admin_comment = NULL
            WHERE id = $1 AND status = $5 AND retired_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&correction.evaluation_json)
        .bind(CorrectionStatus::Pending.as_str())
        .bind(correction.submitted_at)
        .bind(CorrectionStatus::RevisionRequested.as_str())
        .fetch_optional(db)
        .await?;

        Ok(correction)
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
    ) -> AppResult<Option<Correction>> {
        let correction =
            sqlx::query_as::<_, Correction>(r#"SELECT * FROM corrections WHERE id = $1"#)
                .bind(id)
                .fetch_optional(db)
                .await?;

        Ok(correction)
    }

    /// Find correction by ID and lock the row until the transaction ends
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
    ) -> AppResult<Option<Correction>> {
        let correction = sqlx::query_as::<_, Correction>(
            r#"SELECT * FROM corrections WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(correction)
    }

    /// The live correction of one corrector on a submission
    pub async fn find_current_by_corrector<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
        corrector_id: &Uuid,
    ) -> AppResult<Option<Correction>> {
        let correction = sqlx::query_as::<_, Correction>(
            r#"
            SELECT * FROM corrections
            WHERE submission_id = $1 AND corrector_id = $2 AND retired_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(submission_id)
        .bind(corrector_id)
        .fetch_optional(db)
        .await?;

        Ok(correction)
    }

    pub async fn list_by_submission<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
    ) -> AppResult<Vec<Correction>> {
        let corrections = sqlx::query_as::<_, Correction>(
            r#"
            SELECT * FROM corrections
            WHERE submission_id = $1
            ORDER BY submitted_at ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(db)
        .await?;

        Ok(corrections)
    }

    pub async fn mark_validated<'e, E: PgExecutor<'e>>(
        db: E,
        approval: &CorrectionApproval,
    ) -> AppResult<Correction> {
        let correction = sqlx::query_as::<_, Correction>(
            r#"
            UPDATE corrections
            SET status = $2, validated_by = $3, validated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(approval.correction_id)
        .bind(CorrectionStatus::Validated.as_str())
        .bind(approval.validated_by)
        .bind(approval.validated_at)
        .fetch_one(db)
        .await?;

        Ok(correction)
    }

    /// Apply an admin refusal: a rejection retires the correction, a
    /// revision request keeps it current for the next submission
    pub async fn mark_refused<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
        kind: RejectionKind,
        comment: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Correction> {
        let (status, retired_at) = match kind {
            RejectionKind::Rejected => (CorrectionStatus::Rejected, Some(at)),
            RejectionKind::RevisionRequested => (CorrectionStatus::RevisionRequested, None),
        };

        let correction = sqlx::query_as::<_, Correction>(
            r#"
            UPDATE corrections
            SET status = $2, admin_comment = $3, retired_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(comment)
        .bind(retired_at)
        .fetch_one(db)
        .await?;

        Ok(correction)
    }

    /// Retire corrections of a submission that were sent back for revision
    pub async fn retire_revision_requests<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE corrections
            SET retired_at = $3
            WHERE submission_id = $1 AND status = $2 AND retired_at IS NULL
            "#,
        )
        .bind(submission_id)
        .bind(CorrectionStatus::RevisionRequested.as_str())
        .bind(at)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Snapshot a correction into the rejection history
    pub async fn insert_rejection<'e, E: PgExecutor<'e>>(
        db: E,
        correction: &Correction,
        rejection: &NewRejection,
    ) -> AppResult<RejectionRecord> {
        let record = sqlx::query_as::<_, RejectionRecord>(
            r#"
            INSERT INTO rejections (
                correction_id, submission_id, corrector_id, kind, evaluation_json,
                score, comment, rejected_by, rejected_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(correction.id)
        .bind(correction.submission_id)
        .bind(correction.corrector_id)
        .bind(rejection.kind.as_str())
        .bind(&correction.evaluation_json)
        .bind(rejection.score)
        .bind(&rejection.comment)
        .bind(rejection.rejected_by)
        .bind(rejection.rejected_at)
        .fetch_one(db)
        .await?;

        Ok(record)
    }

    pub async fn list_rejections<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
    ) -> AppResult<Vec<RejectionRecord>> {
        let records = sqlx::query_as::<_, RejectionRecord>(
            r#"
            SELECT * FROM rejections
            WHERE submission_id = $1
            ORDER BY rejected_at ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(db)
        .await?;

        Ok(records)
    }
}
