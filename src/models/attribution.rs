//! Attribution model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Assignment of a submission to one corrector
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Attribution {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub corrector_id: Uuid,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Data needed to insert an attribution
#[derive(Debug, Clone)]
pub struct NewAttribution {
    pub submission_id: Uuid,
    pub corrector_id: Uuid,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Result of an atomic reattribution
#[derive(Debug, Clone, Serialize)]
pub struct Reattribution {
    pub previous: Attribution,
    pub current: Attribution,
}
