//! Grade calculation
//!
//! Turns a raw evaluation document into a score. Everything here is pure:
//! the same document and grid always produce the same score, so the
//! corrector view, admin validation and statistics never disagree.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    constants::LEGACY_TOTAL_SCORE_KEY,
    models::{Evaluation, GradingGrid, InvalidEvaluation},
};

/// Computed score of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Sum of awarded points
    pub points: f64,
    /// Grid total, `None` for legacy evaluations scored without a grid
    pub max_points: Option<f64>,
}

impl ScoreBreakdown {
    /// Points rescaled to `scale` against the grid total
    pub fn normalized(&self, scale: f64) -> Option<f64> {
        self.max_points
            .filter(|max| *max > 0.0)
            .map(|max| self.points / max * scale)
    }
}

/// Grade calculator
pub struct GradeCalculator;

impl GradeCalculator {
    /// Compute the score of a raw evaluation document.
    ///
    /// With a grid, every awarded criterion must belong to the grid and stay
    /// within its maximum; blank criteria count as zero. Without a grid the
    /// legacy total-score key is summed instead.
    pub fn compute_final_score(
        raw: &str,
        grid: Option<&GradingGrid>,
    ) -> Result<ScoreBreakdown, InvalidEvaluation> {
        match grid {
            Some(grid) => {
                let evaluation = Evaluation::parse(raw)?;
                Self::score_against_grid(&evaluation, grid)
            }
            None => {
                let value: Value = serde_json::from_str(raw)
                    .map_err(|e| InvalidEvaluation::Malformed(e.to_string()))?;
                Self::score_legacy(&value)
            }
        }
    }

    /// Score a parsed evaluation against a grid
    pub fn score_against_grid(
        evaluation: &Evaluation,
        grid: &GradingGrid,
    ) -> Result<ScoreBreakdown, InvalidEvaluation> {
        if let Some(unknown) = evaluation
            .awards
            .keys()
            .find(|key| grid.criterion(key).is_none())
        {
            return Err(InvalidEvaluation::UnknownCriterion(unknown.clone()));
        }

        // Summed in grid order so the float result never depends on map order
        let mut points = 0.0;
        for criterion in &grid.criteria {
            let awarded = evaluation.points_for(&criterion.key);
            if awarded > criterion.max_points {
                return Err(InvalidEvaluation::AboveMaximum {
                    key: criterion.key.clone(),
                    awarded,
                    max: criterion.max_points,
                });
            }
            points += awarded;
        }

        Ok(ScoreBreakdown {
            points,
            max_points: Some(grid.total()),
        })
    }

    /// Legacy scoring: only the total-score key counts, but every other
    /// award must still be a valid one.
    fn score_legacy(value: &Value) -> Result<ScoreBreakdown, InvalidEvaluation> {
        let object = value.as_object().ok_or(InvalidEvaluation::NotAnObject)?;

        let others: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| key.as_str() != LEGACY_TOTAL_SCORE_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Evaluation::from_value(&Value::Object(others))?;

        // A non-numeric total is read as zero, not rejected
        let numbers: Vec<f64> = match object.get(LEGACY_TOTAL_SCORE_KEY) {
            Some(Value::Number(n)) => n.as_f64().into_iter().collect(),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
            Some(Value::Object(fields)) => fields.values().filter_map(Value::as_f64).collect(),
            _ => Vec::new(),
        };

        if numbers.iter().any(|n| *n < 0.0) {
            return Err(InvalidEvaluation::Negative(
                LEGACY_TOTAL_SCORE_KEY.to_string(),
            ));
        }

        Ok(ScoreBreakdown {
            points: numbers
                .iter()
                .filter(|n| n.is_finite())
                .fold(0.0, |acc, n| acc + n),
            max_points: None,
        })
    }
}
