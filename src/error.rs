//! Custom error types and handling
//!
//! This module defines the application's error types and implements
//! conversion to HTTP responses for the Axum framework.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::constants::constraints;
use crate::models::{CorrectionStatus, InvalidEvaluation, SubmissionStatus};

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid evaluation: {0}")]
    InvalidEvaluation(#[from] InvalidEvaluation),

    #[error("A rejection or revision request requires a non-empty comment")]
    MissingComment,

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // Workflow errors
    #[error("Submission {submission_id} is already attributed to corrector {corrector_id}")]
    AlreadyAttributed {
        submission_id: Uuid,
        corrector_id: Uuid,
    },

    #[error("Correction {correction_id} has already been validated")]
    AlreadyValidated { correction_id: Uuid },

    #[error("Correction {correction_id} is no longer awaiting validation (status: {status})")]
    AlreadyRejected {
        correction_id: Uuid,
        status: CorrectionStatus,
    },

    #[error("Submission {submission_id} is locked in status {status}")]
    LockedSubmission {
        submission_id: Uuid,
        status: SubmissionStatus,
    },

    #[error("Concurrent modification of {subject}, reload and retry")]
    ConcurrentModification { subject: String },

    #[error("Grading grid of contest {contest_id} is locked: graded submissions exist")]
    GridLocked { contest_id: Uuid },

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidEvaluation(_) => "INVALID_EVALUATION",
            Self::MissingComment => "MISSING_COMMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::AlreadyAttributed { .. } => "ALREADY_ATTRIBUTED",
            Self::AlreadyValidated { .. } => "ALREADY_VALIDATED",
            Self::AlreadyRejected { .. } => "ALREADY_REJECTED",
            Self::LockedSubmission { .. } => "LOCKED_SUBMISSION",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::GridLocked { .. } => "GRID_LOCKED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::TokenExpired | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::MissingComment => StatusCode::BAD_REQUEST,
            Self::InvalidEvaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_)
            | Self::AlreadyAttributed { .. }
            | Self::AlreadyValidated { .. }
            | Self::AlreadyRejected { .. }
            | Self::LockedSubmission { .. }
            | Self::ConcurrentModification { .. }
            | Self::GridLocked { .. } => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) | Self::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Subject and state context for workflow errors
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::AlreadyAttributed {
                submission_id,
                corrector_id,
            } => Some(json!({
                "submission_id": submission_id,
                "corrector_id": corrector_id,
            })),
            Self::AlreadyValidated { correction_id } => Some(json!({
                "correction_id": correction_id,
                "status": CorrectionStatus::Validated,
            })),
            Self::AlreadyRejected {
                correction_id,
                status,
            } => Some(json!({ "correction_id": correction_id, "status": status })),
            Self::LockedSubmission {
                submission_id,
                status,
            } => Some(json!({ "submission_id": submission_id, "status": status })),
            Self::ConcurrentModification { subject } => {
                Some(json!({ "subject": subject, "retryable": true }))
            }
            Self::GridLocked { contest_id } => Some(json!({ "contest_id": contest_id })),
            _ => None,
        }
    }

    /// Whether the caller may retry the same request after reloading
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::Configuration(e) => {
                tracing::error!("Configuration error: {}", e);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// Implement From for common error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    unique_violation(db_err.constraint())
                } else if db_err.is_foreign_key_violation() {
                    AppError::NotFound("Referenced resource not found".to_string())
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

/// Map a unique constraint onto the domain conflict it guards
fn unique_violation(constraint: Option<&str>) -> AppError {
    match constraint {
        Some(constraints::CONTEST_TITLE_UNIQUE) => {
            AppError::AlreadyExists("A contest with this title already exists".to_string())
        }
        Some(constraints::SUBMISSION_CANDIDATE_UNIQUE) => AppError::AlreadyExists(
            "Candidate already has a submission for this contest".to_string(),
        ),
        Some(constraints::SUBMISSION_ANONYMOUS_ID_UNIQUE) => AppError::ConcurrentModification {
            subject: "anonymous identifier".to_string(),
        },
        Some(constraints::CORRECTION_CURRENT_UNIQUE) => AppError::ConcurrentModification {
            subject: "correction".to_string(),
        },
        Some(constraints::ATTRIBUTION_SUBMISSION_UNIQUE) => AppError::ConcurrentModification {
            subject: "attribution".to_string(),
        },
        _ => AppError::AlreadyExists("Resource already exists".to_string()),
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_errors_are_conflicts() {
        let id = Uuid::new_v4();
        let err = AppError::LockedSubmission {
            submission_id: id,
            status: SubmissionStatus::Graded,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "LOCKED_SUBMISSION");

        let details = err.details().unwrap();
        assert_eq!(details["status"], "graded");
        assert_eq!(details["submission_id"], id.to_string());
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        let concurrent = AppError::ConcurrentModification {
            subject: "correction".to_string(),
        };
        assert!(concurrent.is_retryable());
        assert!(!AppError::MissingComment.is_retryable());
        assert_eq!(AppError::MissingComment.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unique_violations_map_to_domain_conflicts() {
        assert!(unique_violation(Some(constraints::SUBMISSION_ANONYMOUS_ID_UNIQUE)).is_retryable());
        assert!(unique_violation(Some(constraints::CORRECTION_CURRENT_UNIQUE)).is_retryable());
        assert!(matches!(
            unique_violation(Some(constraints::SUBMISSION_CANDIDATE_UNIQUE)),
            AppError::AlreadyExists(_)
        ));
        assert!(matches!(unique_violation(None), AppError::AlreadyExists(_)));
    }

    #[test]
    fn test_invalid_evaluation_maps_to_unprocessable() {
        let err: AppError = InvalidEvaluation::Negative("criterion1".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "INVALID_EVALUATION");
    }
}
