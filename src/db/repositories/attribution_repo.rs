//! Attribution repository

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Attribution, CorrectionStatus, NewAttribution},
};

/// Repository for attribution database operations
pub struct AttributionRepository;

impl AttributionRepository {
    /// Insert an attribution unless the submission already has one.
    ///
    /// Returns `None` when another attribution won the unique slot.
    pub async fn insert_if_absent<'e, E: PgExecutor<'e>>(
        db: E,
        attribution: &NewAttribution,
    ) -> AppResult<Option<Attribution>> {
        let attribution = sqlx::query_as::<_, Attribution>(
            r#"
            INSERT INTO attributions (submission_id, corrector_id, assigned_by, assigned_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (submission_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(attribution.submission_id)
        .bind(attribution.corrector_id)
        .bind(attribution.assigned_by)
        .bind(attribution.assigned_at)
        .fetch_optional(db)
        .await?;

        Ok(attribution)
    }

    pub async fn find_by_submission<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
    ) -> AppResult<Option<Attribution>> {
        let attribution = sqlx::query_as::<_, Attribution>(
            r#"SELECT * FROM attributions WHERE submission_id = $1"#,
        )
        .bind(submission_id)
        .fetch_optional(db)
        .await?;

        Ok(attribution)
    }

    pub async fn delete_by_submission<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
    ) -> AppResult<Option<Attribution>> {
        let attribution = sqlx::query_as::<_, Attribution>(
            r#"DELETE FROM attributions WHERE submission_id = $1 RETURNING *"#,
        )
        .bind(submission_id)
        .fetch_optional(db)
        .await?;

        Ok(attribution)
    }

    /// Attributions of a corrector that still wait for a correction
    pub async fn list_awaiting<'e, E: PgExecutor<'e>>(
        db: E,
        corrector_id: &Uuid,
    ) -> AppResult<Vec<Attribution>> {
        let attributions = sqlx::query_as::<_, Attribution>(
            r#"
            SELECT a.* FROM attributions a
            WHERE a.corrector_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM corrections c
                  WHERE c.submission_id = a.submission_id
                    AND c.corrector_id = a.corrector_id
                    AND c.retired_at IS NULL
                    AND c.status IN ($2, $3)
              )
            ORDER BY a.assigned_at ASC
            "#,
        )
        .bind(corrector_id)
        .bind(CorrectionStatus::Pending.as_str())
        .bind(CorrectionStatus::Validated.as_str())
        .fetch_all(db)
        .await?;

        Ok(attributions)
    }
}
