//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Attribution, Submission, SubmissionStatus};

/// Submission response
///
/// Never carries the candidate or the file path.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub anonymous_id: String,
    pub contest_id: Uuid,
    pub status: SubmissionStatus,
    pub final_score: Option<f64>,
    pub deposited_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            anonymous_id: submission.anonymous_id,
            contest_id: submission.contest_id,
            status: submission.status,
            final_score: submission.final_score,
            deposited_at: submission.deposited_at,
            updated_at: submission.updated_at,
        }
    }
}

/// Current attribution of a submission
#[derive(Debug, Serialize)]
pub struct AttributionResponse {
    pub submission_id: Uuid,
    pub attribution: Option<Attribution>,
}
