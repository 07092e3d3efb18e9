//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod actor;
pub mod attribution;
pub mod audit;
pub mod contest;
pub mod correction;
pub mod evaluation;
pub mod modification;
pub mod rejection;
pub mod submission;

pub use actor::*;
pub use attribution::*;
pub use audit::*;
pub use contest::*;
pub use correction::*;
pub use evaluation::*;
pub use modification::*;
pub use rejection::*;
pub use submission::*;

/// Error raised when a stored enum column holds an unknown value
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
