//! Rejection records: immutable snapshots of corrections an admin sent back

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub id: Uuid,
    pub correction_id: Uuid,
    pub submission_id: Uuid,
    pub corrector_id: Uuid,
    #[sqlx(try_from = "String")]
    pub kind: RejectionKind,
    pub evaluation_json: String,
    /// Score computed at rejection time; absent when the evaluation no
    /// longer scores against the current grid
    pub score: Option<f64>,
    pub comment: String,
    pub rejected_by: Uuid,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Correction retired, corrector starts over
    Rejected,
    /// Correction kept, corrector amends it
    RevisionRequested,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::RevisionRequested => "revision_requested",
        }
    }
}

impl TryFrom<String> for RejectionKind {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "rejected" => Ok(Self::Rejected),
            "revision_requested" => Ok(Self::RevisionRequested),
            _ => Err(UnknownVariant {
                kind: "rejection kind",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRejection {
    pub correction_id: Uuid,
    pub kind: RejectionKind,
    pub score: Option<f64>,
    pub comment: String,
    pub rejected_by: Uuid,
    pub rejected_at: DateTime<Utc>,
}
