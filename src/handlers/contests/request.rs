//! Contest request DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::{
    constants::{MAX_CONTEST_DESCRIPTION_LENGTH, MAX_CONTEST_TITLE_LENGTH},
    models::{ContestStatus, GradingGrid, NewContest},
};

/// Create contest request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContestRequest {
    #[validate(length(min = 1, max = MAX_CONTEST_TITLE_LENGTH))]
    pub title: String,

    #[validate(length(max = MAX_CONTEST_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    /// Deposits are accepted from this instant
    pub opens_at: DateTime<Utc>,

    /// Deposits are refused after this instant
    pub closes_at: DateTime<Utc>,

    /// Ordered scoring criteria (optional, legacy scoring without one)
    pub grading_grid: Option<GradingGrid>,
}

impl From<CreateContestRequest> for NewContest {
    fn from(req: CreateContestRequest) -> Self {
        NewContest {
            title: req.title,
            description: req.description,
            opens_at: req.opens_at,
            closes_at: req.closes_at,
            grading_grid: req.grading_grid,
        }
    }
}

/// Replace or remove the grading grid
#[derive(Debug, Deserialize)]
pub struct UpdateGridRequest {
    pub grading_grid: Option<GradingGrid>,
}

/// Move a contest through draft, open and closed
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ContestStatus,
}
