//! Contest statistics

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Submission, SubmissionStatus};

/// Aggregate view of a contest's submissions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestStatistics {
    pub contest_id: Uuid,
    pub total: usize,
    pub pending: usize,
    pub in_correction: usize,
    pub correction_submitted: usize,
    pub graded: usize,
    pub mean_score: Option<f64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl ContestStatistics {
    /// Aggregate submissions of one contest.
    ///
    /// Only graded submissions carry a score. A final score of zero is a
    /// real score and counts toward the mean.
    pub fn from_submissions(contest_id: Uuid, submissions: &[Submission]) -> Self {
        let count = |status: SubmissionStatus| {
            submissions.iter().filter(|s| s.status == status).count()
        };

        let scores: Vec<f64> = submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Graded)
            .filter_map(|s| s.final_score)
            .collect();

        let mean_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Self {
            contest_id,
            total: submissions.len(),
            pending: count(SubmissionStatus::Pending),
            in_correction: count(SubmissionStatus::InCorrection),
            correction_submitted: count(SubmissionStatus::CorrectionSubmitted),
            graded: count(SubmissionStatus::Graded),
            mean_score,
            min_score: scores.iter().copied().reduce(f64::min),
            max_score: scores.iter().copied().reduce(f64::max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn submission(status: SubmissionStatus, final_score: Option<f64>) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            anonymous_id: Uuid::new_v4().to_string(),
            encrypted_path: String::new(),
            contest_id: Uuid::nil(),
            candidate_id: Uuid::new_v4(),
            status,
            final_score,
            deposited_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_is_a_score_and_ungraded_is_not() {
        let submissions = vec![
            submission(SubmissionStatus::Graded, Some(0.0)),
            submission(SubmissionStatus::Graded, Some(16.0)),
            submission(SubmissionStatus::InCorrection, None),
            submission(SubmissionStatus::Pending, None),
        ];

        let stats = ContestStatistics::from_submissions(Uuid::nil(), &submissions);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.graded, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_correction, 1);
        assert_eq!(stats.mean_score, Some(8.0));
        assert_eq!(stats.min_score, Some(0.0));
        assert_eq!(stats.max_score, Some(16.0));
    }

    #[test]
    fn test_no_graded_submissions_has_no_scores() {
        let submissions = vec![submission(SubmissionStatus::CorrectionSubmitted, None)];
        let stats = ContestStatistics::from_submissions(Uuid::nil(), &submissions);
        assert_eq!(stats.correction_submitted, 1);
        assert_eq!(stats.mean_score, None);
        assert_eq!(stats.min_score, None);
    }
}
