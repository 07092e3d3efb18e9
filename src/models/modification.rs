//! File modification history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only record of a candidate replacing their file
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ModificationRecord {
    pub id: Uuid,
    pub submission_id: Uuid,
    #[serde(skip_serializing)]
    pub previous_encrypted_path: String,
    #[serde(skip_serializing)]
    pub new_encrypted_path: String,
    pub reason: String,
    pub modified_by: Uuid,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FileReplacement {
    pub submission_id: Uuid,
    pub new_encrypted_path: String,
    pub reason: String,
    pub modified_by: Uuid,
    pub modified_at: DateTime<Utc>,
}
