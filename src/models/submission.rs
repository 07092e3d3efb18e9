//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub anonymous_id: String,
    #[serde(skip_serializing)]
    pub encrypted_path: String,
    pub contest_id: Uuid,
    #[serde(skip_serializing)]
    pub candidate_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub final_score: Option<f64>,
    pub deposited_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission lifecycle status
///
/// A rejected correction sends the submission straight back to
/// `InCorrection`, so there is no persisted rejected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    InCorrection,
    CorrectionSubmitted,
    Graded,
}

impl SubmissionStatus {
    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InCorrection => "in_correction",
            Self::CorrectionSubmitted => "correction_submitted",
            Self::Graded => "graded",
        }
    }

    /// Whether the candidate may still replace the file
    pub fn allows_file_replacement(&self) -> bool {
        matches!(self, Self::Pending | Self::InCorrection)
    }

    /// Check if a scored correction is waiting on or already behind this
    /// submission; the contest's grid is frozen while any is
    pub fn has_scored_correction(&self) -> bool {
        matches!(self, Self::CorrectionSubmitted | Self::Graded)
    }
}

impl TryFrom<String> for SubmissionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "in_correction" => Ok(Self::InCorrection),
            "correction_submitted" => Ok(Self::CorrectionSubmitted),
            "graded" => Ok(Self::Graded),
            _ => Err(UnknownVariant {
                kind: "submission status",
                value,
            }),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data needed to insert a submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub anonymous_id: String,
    pub encrypted_path: String,
    pub contest_id: Uuid,
    pub candidate_id: Uuid,
    pub deposited_at: DateTime<Utc>,
}
