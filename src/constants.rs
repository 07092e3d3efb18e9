//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Largest request body accepted, evaluations and grids included
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// STORAGE & CIPHER DEFAULTS
// =============================================================================

/// Default root directory of the submission file store
pub const DEFAULT_STORAGE_ROOT: &str = "/data/submissions";

/// AES-256 key length in bytes
pub const CIPHER_KEY_BYTES: usize = 32;

/// AES-GCM nonce length in bytes
pub const CIPHER_NONCE_BYTES: usize = 12;

/// Version tag prefixed to every encrypted path
pub const CIPHER_FORMAT_VERSION: &str = "v1";

// =============================================================================
// WORKFLOW DEFAULTS
// =============================================================================

/// How many times anonymous id generation retries on a collision
pub const DEFAULT_ANONYMOUS_ID_MAX_ATTEMPTS: u32 = 8;

/// Length of the random part of an anonymous identifier
pub const ANONYMOUS_ID_TOKEN_LENGTH: usize = 12;

/// Scale scores are normalized to for display (French-style /20)
pub const DEFAULT_GRADING_SCALE: f64 = 20.0;

/// Evaluation key holding the corrector's free-text comment
pub const EVALUATION_COMMENT_KEY: &str = "general_comment";

/// Evaluation key read when the contest has no grading grid
pub const LEGACY_TOTAL_SCORE_KEY: &str = "total_score";

/// Maximum length of admin comments and modification reasons
pub const MAX_COMMENT_LENGTH: u64 = 4000;

/// Maximum contest title length
pub const MAX_CONTEST_TITLE_LENGTH: u64 = 256;

/// Maximum contest description length
pub const MAX_CONTEST_DESCRIPTION_LENGTH: u64 = 10000;

/// Maximum length of a plain file path handed over by the file store
pub const MAX_FILE_PATH_LENGTH: u64 = 1024;

/// Default number of audit entries returned by listings
pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLES
// =============================================================================

/// Actor roles as carried in access tokens
pub mod roles {
    pub const CANDIDATE: &str = "candidate";
    pub const CORRECTOR: &str = "corrector";
    pub const ADMIN: &str = "admin";
}

// =============================================================================
// DATABASE CONSTRAINTS
// =============================================================================

/// Constraint names from the migrations, used to map unique violations
pub mod constraints {
    pub const CONTEST_TITLE_UNIQUE: &str = "contests_title_key";
    pub const SUBMISSION_ANONYMOUS_ID_UNIQUE: &str = "submissions_anonymous_id_key";
    pub const SUBMISSION_CANDIDATE_UNIQUE: &str = "submissions_contest_candidate_key";
    pub const ATTRIBUTION_SUBMISSION_UNIQUE: &str = "attributions_submission_id_key";
    pub const CORRECTION_CURRENT_UNIQUE: &str = "corrections_current_unique";
}
