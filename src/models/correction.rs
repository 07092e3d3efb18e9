//! Correction model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{GradingGrid, UnknownVariant};

/// A corrector's evaluation of a submission
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Correction {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub corrector_id: Uuid,
    /// Raw evaluation document, kept byte-for-byte as submitted
    pub evaluation_json: String,
    #[sqlx(try_from = "String")]
    pub status: CorrectionStatus,
    pub submitted_at: DateTime<Utc>,
    pub admin_comment: Option<String>,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    /// Set when a rejection or reattribution supersedes this correction
    pub retired_at: Option<DateTime<Utc>>,
}

impl Correction {
    /// Whether this is the live correction for its (submission, corrector) pair
    pub fn is_current(&self) -> bool {
        self.retired_at.is_none()
    }
}

/// Admin validation status of a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    Pending,
    Validated,
    Rejected,
    RevisionRequested,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
            Self::RevisionRequested => "revision_requested",
        }
    }
}

impl TryFrom<String> for CorrectionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "validated" => Ok(Self::Validated),
            "rejected" => Ok(Self::Rejected),
            "revision_requested" => Ok(Self::RevisionRequested),
            _ => Err(UnknownVariant {
                kind: "correction status",
                value,
            }),
        }
    }
}

impl std::fmt::Display for CorrectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data needed to record a corrector's submission
#[derive(Debug, Clone)]
pub struct NewCorrection {
    pub submission_id: Uuid,
    pub corrector_id: Uuid,
    pub evaluation_json: String,
    pub submitted_at: DateTime<Utc>,
    /// Grid the evaluation was scored against; the store refuses the write
    /// if the contest's grid no longer matches
    pub scored_against: Option<GradingGrid>,
}

/// Admin approval of a pending correction
#[derive(Debug, Clone)]
pub struct CorrectionApproval {
    pub correction_id: Uuid,
    pub validated_by: Uuid,
    pub validated_at: DateTime<Utc>,
    pub final_score: f64,
}
