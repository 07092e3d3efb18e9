//! Audit log service
//!
//! Records security-relevant actions. A failed write never fails the action
//! being audited: it is logged at `error` under the `audit` target and
//! counted so operators see it on the health endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::{
    constants::DEFAULT_AUDIT_PAGE_SIZE,
    db::AuditSink,
    error::{AppError, AppResult},
    models::{ActorContext, AuditAction, AuditEntry, NewAuditEntry},
};

/// An audit entry that could not be persisted
#[derive(Debug, thiserror::Error)]
#[error("failed to record audit entry {action} on {subject}: {source}")]
pub struct AuditWriteFailure {
    pub action: AuditAction,
    pub subject: String,
    #[source]
    pub source: AppError,
}

/// Append-only audit log
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
    failures: AtomicU64,
}

impl AuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            failures: AtomicU64::new(0),
        }
    }

    /// Record an action, best effort
    pub async fn record(
        &self,
        actor: &ActorContext,
        action: AuditAction,
        subject: impl Into<String>,
    ) {
        let entry = NewAuditEntry {
            actor_id: actor.actor_id,
            action,
            subject: subject.into(),
            recorded_at: Utc::now(),
        };

        if let Err(source) = self.sink.append(&entry).await {
            let failure = AuditWriteFailure {
                action,
                subject: entry.subject,
                source,
            };
            let total = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::error!(
                target: "audit",
                actor_id = %actor.actor_id,
                action = %failure.action,
                subject = %failure.subject,
                failures_total = total,
                error = %failure,
                "Audit write failed"
            );
        }
    }

    /// Number of audit writes that failed since startup
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Most recent entries, newest first (admin only)
    pub async fn recent(
        &self,
        actor: &ActorContext,
        limit: Option<i64>,
    ) -> AppResult<Vec<AuditEntry>> {
        actor.require_admin()?;
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_AUDIT_PAGE_SIZE)
            .min(DEFAULT_AUDIT_PAGE_SIZE * 10);
        self.sink.recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, store::MockAuditSink};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_record_appends_entry() {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditLog::new(store.clone());
        let admin = ActorContext::admin(Uuid::new_v4());

        audit
            .record(&admin, AuditAction::FileAccessed, "submission ANO-1")
            .await;

        let entries = audit.recent(&admin, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::FileAccessed);
        assert_eq!(entries[0].actor_id, admin.actor_id);
        assert_eq!(audit.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_counted_not_raised() {
        let mut sink = MockAuditSink::new();
        sink.expect_append()
            .times(2)
            .returning(|_| Err(AppError::Database("connection reset".to_string())));

        let audit = AuditLog::new(Arc::new(sink));
        let actor = ActorContext::corrector(Uuid::new_v4());
        audit
            .record(&actor, AuditAction::CorrectionSubmitted, "submission 1")
            .await;
        audit
            .record(&actor, AuditAction::CorrectionSubmitted, "submission 2")
            .await;

        assert_eq!(audit.failure_count(), 2);
    }

    #[tokio::test]
    async fn test_recent_requires_admin() {
        let audit = AuditLog::new(Arc::new(MemoryStore::new()));
        let corrector = ActorContext::corrector(Uuid::new_v4());
        assert!(matches!(
            audit.recent(&corrector, None).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
