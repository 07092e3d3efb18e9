//! Contest model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

use super::UnknownVariant;

/// Contest database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contest {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub grading_grid: Option<Json<GradingGrid>>,
    #[sqlx(try_from = "String")]
    pub status: ContestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contest {
    /// The grading grid, if the contest has one
    pub fn grid(&self) -> Option<&GradingGrid> {
        self.grading_grid.as_ref().map(|g| &g.0)
    }

    /// Check whether candidates may deposit at `now`
    pub fn accepts_deposits(&self, now: DateTime<Utc>) -> bool {
        self.status == ContestStatus::Open && now >= self.opens_at && now <= self.closes_at
    }
}

/// Contest lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Draft,
    Open,
    Closed,
}

impl ContestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<String> for ContestStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(UnknownVariant {
                kind: "contest status",
                value,
            }),
        }
    }
}

impl std::fmt::Display for ContestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered list of scoring criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingGrid {
    pub criteria: Vec<Criterion>,
}

/// One scoring criterion of a grading grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub max_points: f64,
}

impl GradingGrid {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    /// Look up a criterion by key
    pub fn criterion(&self, key: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.key == key)
    }

    /// Sum of all criterion maxima, in grid order
    pub fn total(&self) -> f64 {
        self.criteria.iter().fold(0.0, |acc, c| acc + c.max_points)
    }
}

impl Criterion {
    pub fn new(key: impl Into<String>, max_points: f64) -> Self {
        Self {
            key: key.into(),
            label: None,
            max_points,
        }
    }
}

/// Data needed to insert a contest
#[derive(Debug, Clone)]
pub struct NewContest {
    pub title: String,
    pub description: Option<String>,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub grading_grid: Option<GradingGrid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn contest(status: ContestStatus) -> Contest {
        let now = Utc::now();
        Contest {
            id: Uuid::new_v4(),
            title: "Concours".to_string(),
            description: None,
            opens_at: now - Duration::hours(1),
            closes_at: now + Duration::hours(1),
            grading_grid: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_accepts_deposits_only_when_open_and_in_window() {
        let now = Utc::now();
        assert!(contest(ContestStatus::Open).accepts_deposits(now));
        assert!(!contest(ContestStatus::Draft).accepts_deposits(now));
        assert!(!contest(ContestStatus::Closed).accepts_deposits(now));
        assert!(!contest(ContestStatus::Open).accepts_deposits(now + Duration::hours(2)));
    }

    #[test]
    fn test_grid_total_and_lookup() {
        let grid = GradingGrid::new(vec![
            Criterion::new("criterion1", 10.0),
            Criterion::new("criterion2", 10.0),
        ]);
        assert_eq!(grid.total(), 20.0);
        assert_eq!(grid.criterion("criterion2").unwrap().max_points, 10.0);
        assert!(grid.criterion("criterion3").is_none());
    }
}
