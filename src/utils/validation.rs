//! Input validation utilities

use std::collections::HashSet;

use crate::{
    constants::{MAX_COMMENT_LENGTH, MAX_CONTEST_TITLE_LENGTH, EVALUATION_COMMENT_KEY},
    models::GradingGrid,
};

/// Sanitize string input (remove control characters, trim whitespace)
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validate and sanitize a contest title
pub fn validate_contest_title(title: &str) -> Result<String, &'static str> {
    let sanitized = sanitize_string(title);
    if sanitized.is_empty() {
        return Err("Contest title cannot be empty");
    }
    if sanitized.chars().count() > MAX_CONTEST_TITLE_LENGTH as usize {
        return Err("Contest title must be at most 256 characters");
    }
    Ok(sanitized)
}

/// Validate an admin comment; `None` when it is blank
pub fn normalize_comment(comment: &str) -> Result<Option<String>, &'static str> {
    let sanitized = sanitize_string(comment);
    if sanitized.is_empty() {
        return Ok(None);
    }
    if sanitized.chars().count() > MAX_COMMENT_LENGTH as usize {
        return Err("Comment must be at most 4000 characters");
    }
    Ok(Some(sanitized))
}

/// Validate a grading grid definition
pub fn validate_grading_grid(grid: &GradingGrid) -> Result<(), String> {
    if grid.criteria.is_empty() {
        return Err("Grading grid must contain at least one criterion".to_string());
    }

    let mut seen = HashSet::new();
    for criterion in &grid.criteria {
        let key = criterion.key.trim();
        if key.is_empty() {
            return Err("Criterion keys cannot be empty".to_string());
        }
        if key == EVALUATION_COMMENT_KEY {
            return Err(format!("'{}' is reserved for the comment", key));
        }
        if !seen.insert(key) {
            return Err(format!("Duplicate criterion '{}'", key));
        }
        if !criterion.max_points.is_finite() || criterion.max_points <= 0.0 {
            return Err(format!(
                "Criterion '{}' must have a positive maximum",
                key
            ));
        }
    }
    Ok(())
}

/// Validate a file path handed over by the file store
pub fn validate_file_path(path: &str) -> Result<(), &'static str> {
    if path.trim().is_empty() {
        return Err("File path cannot be empty");
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err("File path cannot contain parent directory segments");
    }
    if path.contains('\0') {
        return Err("File path cannot contain NUL bytes");
    }
    Ok(())
}
