//! Contest response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Contest, ContestStatus, GradingGrid};

/// Contest response
#[derive(Debug, Serialize)]
pub struct ContestResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub status: ContestStatus,
    pub grading_grid: Option<GradingGrid>,
    /// Sum of the grid maxima, absent for legacy scoring
    pub max_points: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contest> for ContestResponse {
    fn from(contest: Contest) -> Self {
        let max_points = contest.grid().map(GradingGrid::total);
        Self {
            id: contest.id,
            title: contest.title,
            description: contest.description,
            opens_at: contest.opens_at,
            closes_at: contest.closes_at,
            status: contest.status,
            grading_grid: contest.grading_grid.map(|grid| grid.0),
            max_points,
            created_at: contest.created_at,
            updated_at: contest.updated_at,
        }
    }
}

/// Contest list response
#[derive(Debug, Serialize)]
pub struct ContestsListResponse {
    pub contests: Vec<ContestResponse>,
    pub total: usize,
}
