//! Audit log repository

use sqlx::PgExecutor;

use crate::{
    error::AppResult,
    models::{AuditEntry, NewAuditEntry},
};

/// Repository for the append-only audit log
pub struct AuditRepository;

impl AuditRepository {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        db: E,
        entry: &NewAuditEntry,
    ) -> AppResult<AuditEntry> {
        let entry = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (actor_id, action, subject, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(&entry.subject)
        .bind(entry.recorded_at)
        .fetch_one(db)
        .await?;

        Ok(entry)
    }

    /// Most recent entries, newest first
    pub async fn recent<'e, E: PgExecutor<'e>>(db: E, limit: i64) -> AppResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"SELECT * FROM audit_log ORDER BY recorded_at DESC LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok(entries)
    }
}
