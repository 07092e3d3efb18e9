//! Correction request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::constants::MAX_COMMENT_LENGTH;

/// Admin comment attached to a rejection or revision request
///
/// A blank or absent comment is refused by the workflow itself with
/// `MISSING_COMMENT`, so only the upper bound is checked here.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[serde(default)]
    #[validate(length(max = MAX_COMMENT_LENGTH))]
    pub comment: String,
}
