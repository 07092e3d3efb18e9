//! Submission request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{MAX_COMMENT_LENGTH, MAX_FILE_PATH_LENGTH};

/// Deposit request
///
/// The file itself is already in the file store; only its plain path
/// travels here and it is sealed before being persisted.
#[derive(Debug, Deserialize, Validate)]
pub struct DepositRequest {
    pub contest_id: Uuid,

    #[validate(length(min = 1, max = MAX_FILE_PATH_LENGTH))]
    pub path: String,
}

/// Replace the deposited file
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceFileRequest {
    #[validate(length(min = 1, max = MAX_FILE_PATH_LENGTH))]
    pub path: String,

    #[validate(length(min = 1, max = MAX_COMMENT_LENGTH))]
    pub reason: String,
}

/// Assign or reassign a corrector
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub corrector_id: Uuid,
}
