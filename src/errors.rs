//! Errors
//!
//! Custom error types used throughout the `dml-diagnostics` crate.
use thiserror::Error;

/// Errors that can occur while computing nuisance diagnostics.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// Treatment indicator outside {0, 1}.
    #[error("Treatment value {1} at row {0} is not a 0/1 indicator.")]
    InvalidTreatment(usize, f64),
    /// First value names the dimension, second is expected, third is what was passed.
    #[error("Dimension mismatch for {0}: expected {1} but {2} provided.")]
    DimensionMismatch(String, usize, usize),
    /// Propensity prediction exactly 0 or 1 under the strict clamp policy.
    #[error("Propensity prediction {2} at row {0}, repetition {1} is exactly 0 or 1.")]
    DegenerateProbability(usize, usize, f64),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to serialize a diagnostic result.
    #[error("Unable to serialize diagnostic result: {0}")]
    UnableToSerialize(String),
}
