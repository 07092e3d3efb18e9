//! Utility functions

pub mod crypto;
pub mod time;
pub mod validation;

pub use crypto::{DecryptionError, PathCipher, generate_secure_token, hash_string};
pub use time::is_valid_window;
pub use validation::{sanitize_string, validate_grading_grid};
