//! Contest repository

use chrono::Utc;
use sqlx::{PgExecutor, types::Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Contest, ContestStatus, GradingGrid, NewContest},
};

/// Repository for contest database operations
pub struct ContestRepository;

impl ContestRepository {
    /// Create a new contest in `draft`
    pub async fn create<'e, E: PgExecutor<'e>>(db: E, contest: &NewContest) -> AppResult<Contest> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            INSERT INTO contests (title, description, opens_at, closes_at, grading_grid, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&contest.title)
        .bind(contest.description.as_deref())
        .bind(contest.opens_at)
        .bind(contest.closes_at)
        .bind(contest.grading_grid.as_ref().map(Json))
        .bind(ContestStatus::Draft.as_str())
        .fetch_one(db)
        .await?;

        Ok(contest)
    }

    /// Find contest by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(db: E, id: &Uuid) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(r#"SELECT * FROM contests WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await?;

        Ok(contest)
    }

    /// Find contest by ID and lock the row until the transaction ends
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
    ) -> AppResult<Option<Contest>> {
        let contest =
            sqlx::query_as::<_, Contest>(r#"SELECT * FROM contests WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_optional(db)
                .await?;

        Ok(contest)
    }

    /// Find the contest of a submission and share-lock its row, so a grid
    /// update waits for the transaction to end
    pub async fn find_for_share_by_submission<'e, E: PgExecutor<'e>>(
        db: E,
        submission_id: &Uuid,
    ) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            SELECT c.* FROM contests c
            JOIN submissions s ON s.contest_id = c.id
            WHERE s.id = $1
            FOR SHARE OF c
            "#,
        )
        .bind(submission_id)
        .fetch_optional(db)
        .await?;

        Ok(contest)
    }

    /// List all contests, most recent window first
    pub async fn list<'e, E: PgExecutor<'e>>(db: E) -> AppResult<Vec<Contest>> {
        let contests =
            sqlx::query_as::<_, Contest>(r#"SELECT * FROM contests ORDER BY opens_at DESC"#)
                .fetch_all(db)
                .await?;

        Ok(contests)
    }

    /// Replace the grading grid
    pub async fn update_grid<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
        grid: Option<&GradingGrid>,
    ) -> AppResult<Contest> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            UPDATE contests
            SET grading_grid = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(grid.map(Json))
        .bind(Utc::now())
        .fetch_one(db)
        .await?;

        Ok(contest)
    }

    /// Update contest status
    pub async fn update_status<'e, E: PgExecutor<'e>>(
        db: E,
        id: &Uuid,
        status: ContestStatus,
    ) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            UPDATE contests
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(db)
        .await?;

        Ok(contest)
    }
}
