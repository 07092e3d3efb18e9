//! Submission repository

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{FileReplacement, ModificationRecord, NewSubmission, Submission, SubmissionStatus},
};

/// Repository for submission database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Create a new submission in `pending`
    pub async fn create<'e, E: PgExecutor<'e>>(
        db: E,
        submission: &NewSubmission,
    ) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (
                anonymous_id, encrypted_path, contest_id, candidate_id,
                status, deposited_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&submission.anonymous_id)
        .bind(&submission.encrypted_path)
        .bind(submission.contest_id)
        .bind(submission.candidate_id)
        .bind(SubmissionStatus::Pending.as_str())
        .bind(submission.deposited_at)
        .fetch_one(db)
        .await?;

        Ok(submission)
    }

    /// Find submission by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
    ) -> AppResult<Option<Submission>> {
        let submission =
            sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(db)
                .await?;

        Ok(submission)
    }

    /// Find submission by ID and lock the row until the transaction ends
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
    ) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"SELECT * FROM submissions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(submission)
    }

    /// Check whether an anonymous identifier is taken
    pub async fn anonymous_id_exists<'e, E: PgExecutor<'e>>(
        db: E,
        anonymous_id: &str,
    ) -> AppResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"SELECT EXISTS(SELECT 1 FROM submissions WHERE anonymous_id = $1)"#,
        )
        .bind(anonymous_id)
        .fetch_one(db)
        .await?;

        Ok(exists.0)
    }

    /// List submissions of a contest in deposit order
    pub async fn list_by_contest<'e, E: PgExecutor<'e>>(
        db: E,
        contest_id: &Uuid,
    ) -> AppResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE contest_id = $1
            ORDER BY deposited_at ASC
            "#,
        )
        .bind(contest_id)
        .fetch_all(db)
        .await?;

        Ok(submissions)
    }

    /// Check whether any submission of a contest has a submitted or
    /// validated correction
    pub async fn contest_has_scored_corrections<'e, E: PgExecutor<'e>>(
        db: E,
        contest_id: &Uuid,
    ) -> AppResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM submissions
                WHERE contest_id = $1 AND status IN ($2, $3)
            )
            "#,
        )
        .bind(contest_id)
        .bind(SubmissionStatus::CorrectionSubmitted.as_str())
        .bind(SubmissionStatus::Graded.as_str())
        .fetch_one(db)
        .await?;

        Ok(exists.0)
    }

    /// Set the submission status
    pub async fn update_status<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
        status: SubmissionStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .fetch_one(db)
        .await?;

        Ok(submission)
    }

    /// Mark the submission graded with its final score
    pub async fn grade<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
        final_score: f64,
        at: DateTime<Utc>,
    ) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = $2, final_score = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(SubmissionStatus::Graded.as_str())
        .bind(final_score)
        .bind(at)
        .fetch_one(db)
        .await?;

        Ok(submission)
    }

    /// Point the submission at a new encrypted file reference
    pub async fn update_file<'e, E: PgExecutor<'e>>(
        db: E,
        replacement: &FileReplacement,
    ) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET encrypted_path = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(replacement.submission_id)
        .bind(&replacement.new_encrypted_path)
        .bind(replacement.modified_at)
        .fetch_one(db)
        .await?;

        Ok(submission)
    }

    /// Record a file replacement
    pub async fn insert_modification<'e, E: PgExecutor<'e>>(
        db: E,
        previous_encrypted_path: &str,
        replacement: &FileReplacement,
    ) -> AppResult<ModificationRecord> {
        let record = sqlx::query_as::<_, ModificationRecord>(
            r#"
            INSERT INTO modifications (
                submission_id, previous_encrypted_path, new_encrypted_path,
                reason, modified_by, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(replacement.submission_id)
        .bind(previous_encrypted_path)
        .bind(&replacement.new_encrypted_path)
        .bind(&replacement.reason)
        .bind(replacement.modified_by)
        .bind(replacement.modified_at)
        .fetch_one(db)
        .await?;

        Ok(record)
    }

    /// List file replacements of a submission, oldest first
    pub async fn list_modifications<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
    ) -> AppResult<Vec<ModificationRecord>> {
        let records = sqlx::query_as::<_, ModificationRecord>(
            r#"
            SELECT * FROM modifications
            WHERE submission_id = $1
            ORDER BY modified_at ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(db)
        .await?;

        Ok(records)
    }
}
