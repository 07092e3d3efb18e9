//! Business logic services

pub mod attribution_service;
pub mod audit_service;
pub mod contest_service;
pub mod correction_workflow;
pub mod grading;
pub mod statistics;
pub mod submission_service;

pub use attribution_service::AttributionStore;
pub use audit_service::{AuditLog, AuditWriteFailure};
pub use contest_service::ContestService;
pub use correction_workflow::{
    CorrectionView, CorrectionWorkflow, DisplayScore, ValidatedCorrection,
};
pub use grading::{GradeCalculator, ScoreBreakdown};
pub use statistics::ContestStatistics;
pub use submission_service::{FileAccess, SubmissionHistory, SubmissionService, SubmissionView};
