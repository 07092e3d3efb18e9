//! Audit log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// One append-only audit entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub subject: String,
    pub recorded_at: DateTime<Utc>,
}

/// Security-relevant action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SubmissionDeposited,
    FileAccessed,
    FileAccessFailed,
    FileReplaced,
    Attributed,
    Reattributed,
    Unattributed,
    CorrectionSubmitted,
    CorrectionValidated,
    CorrectionRejected,
    RevisionRequested,
    GridChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmissionDeposited => "submission_deposited",
            Self::FileAccessed => "file_accessed",
            Self::FileAccessFailed => "file_access_failed",
            Self::FileReplaced => "file_replaced",
            Self::Attributed => "attributed",
            Self::Reattributed => "reattributed",
            Self::Unattributed => "unattributed",
            Self::CorrectionSubmitted => "correction_submitted",
            Self::CorrectionValidated => "correction_validated",
            Self::CorrectionRejected => "correction_rejected",
            Self::RevisionRequested => "revision_requested",
            Self::GridChanged => "grid_changed",
        }
    }
}

impl TryFrom<String> for AuditAction {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let action = match value.as_str() {
            "submission_deposited" => Self::SubmissionDeposited,
            "file_accessed" => Self::FileAccessed,
            "file_access_failed" => Self::FileAccessFailed,
            "file_replaced" => Self::FileReplaced,
            "attributed" => Self::Attributed,
            "reattributed" => Self::Reattributed,
            "unattributed" => Self::Unattributed,
            "correction_submitted" => Self::CorrectionSubmitted,
            "correction_validated" => Self::CorrectionValidated,
            "correction_rejected" => Self::CorrectionRejected,
            "revision_requested" => Self::RevisionRequested,
            "grid_changed" => Self::GridChanged,
            _ => {
                return Err(UnknownVariant {
                    kind: "audit action",
                    value,
                });
            }
        };
        Ok(action)
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub subject: String,
    pub recorded_at: DateTime<Utc>,
}
