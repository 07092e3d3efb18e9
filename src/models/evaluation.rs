//! Typed evaluation payload
//!
//! Correctors send a flat JSON object mapping criterion keys to awarded
//! points, plus an optional free-text comment:
//!
//! ```json
//! { "criterion1": 8, "criterion2": 7.5, "general_comment": "Solid work" }
//! ```
//!
//! The raw text is stored untouched; this type is the validated view used
//! for scoring.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::constants::EVALUATION_COMMENT_KEY;

/// Reasons an evaluation document cannot be scored
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEvaluation {
    #[error("malformed evaluation JSON: {0}")]
    Malformed(String),

    #[error("evaluation must be a JSON object")]
    NotAnObject,

    #[error("criterion '{0}' has a non-numeric value")]
    NonNumeric(String),

    #[error("criterion '{0}' awards negative points")]
    Negative(String),

    #[error("criterion '{key}' awards {awarded} points, maximum is {max}")]
    AboveMaximum { key: String, awarded: f64, max: f64 },

    #[error("criterion '{0}' is not part of the grading grid")]
    UnknownCriterion(String),

    #[error("evaluation comment must be a string")]
    InvalidComment,
}

/// Validated evaluation: criterion key to awarded points
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    pub awards: BTreeMap<String, f64>,
    pub comment: Option<String>,
}

impl Evaluation {
    /// Parse and validate a raw evaluation document.
    ///
    /// Every key other than the comment must carry a finite, non-negative
    /// number. Grid bounds are checked later by the grade calculator.
    pub fn parse(raw: &str) -> Result<Self, InvalidEvaluation> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| InvalidEvaluation::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, InvalidEvaluation> {
        let object = value.as_object().ok_or(InvalidEvaluation::NotAnObject)?;

        let mut evaluation = Evaluation::default();
        for (key, value) in object {
            if key == EVALUATION_COMMENT_KEY {
                evaluation.comment = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    _ => return Err(InvalidEvaluation::InvalidComment),
                };
                continue;
            }

            let points = value
                .as_f64()
                .filter(|p| p.is_finite())
                .ok_or_else(|| InvalidEvaluation::NonNumeric(key.clone()))?;
            if points < 0.0 {
                return Err(InvalidEvaluation::Negative(key.clone()));
            }
            evaluation.awards.insert(key.clone(), points);
        }

        Ok(evaluation)
    }

    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }

    /// Points awarded for `key`, zero when the criterion was left blank
    pub fn points_for(&self, key: &str) -> f64 {
        self.awards.get(key).copied().unwrap_or(0.0)
    }
}
