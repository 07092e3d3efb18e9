//! Database repositories
//!
//! Repositories handle all direct database interactions. Every function is
//! generic over the executor so it runs on the pool or inside a transaction.

pub mod attribution_repo;
pub mod audit_repo;
pub mod contest_repo;
pub mod correction_repo;
pub mod submission_repo;

pub use attribution_repo::AttributionRepository;
pub use audit_repo::AuditRepository;
pub use contest_repo::ContestRepository;
pub use correction_repo::CorrectionRepository;
pub use submission_repo::SubmissionRepository;
