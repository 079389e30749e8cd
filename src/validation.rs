//! Structural validation of completion replies against [`SlateEvaluation`].
//!
//! Leaves (plans, sentiments, ratings, averages, summary) may be null or
//! absent; categories and criteria may not, and present leaves must have the
//! right type.

use crate::models::SlateEvaluation;
use thiserror::Error;

/// Why a reply does not match the evaluation schema
#[derive(Debug, Error)]
#[error("response does not match the evaluation schema at line {line}, column {column}: {message}")]
pub struct ValidationFailure {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for ValidationFailure {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Outcome of checking one reply
#[derive(Debug)]
pub enum Verdict {
    Valid(Box<SlateEvaluation>),
    Invalid(ValidationFailure),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }
}

/// Check a reply against the schema. Never fails; mismatches are logged and
/// returned as [`Verdict::Invalid`].
pub fn validate_response(response: &str) -> Verdict {
    match serde_json::from_str::<SlateEvaluation>(response) {
        Ok(evaluation) => {
            log_rating_mismatches(&evaluation);
            Verdict::Valid(Box::new(evaluation))
        }
        Err(err) => {
            let failure = ValidationFailure::from(err);
            tracing::error!(error = %failure, "failed to validate response from completion service");
            Verdict::Invalid(failure)
        }
    }
}

/// Ratings are expected to follow the sentiment mapping but it is not enforced
fn log_rating_mismatches(evaluation: &SlateEvaluation) {
    for (criterion, result) in evaluation.criteria() {
        if result.rating_disagrees_with_sentiment() {
            tracing::warn!(
                criterion,
                sentiment = ?result.sentiment,
                rating = ?result.rating,
                "rating does not follow the sentiment mapping"
            );
        }
    }
}
