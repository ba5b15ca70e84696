use crate::errors::DiagnosticsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of observations for a single binary treatment study.
///
/// Holds the observed outcome vector and the treatment indicator vector.
/// Treatment values are validated at construction: anything other than
/// exactly 0.0 or 1.0 is an input error, never coerced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationSet {
    /// Observed outcomes.
    pub y: Vec<f64>,
    /// Treatment indicators, each exactly 0.0 or 1.0.
    pub d: Vec<f64>,
}

impl ObservationSet {
    /// Create a new observation set from an outcome and a treatment vector.
    ///
    /// * `y` - Observed outcomes.
    /// * `d` - Treatment indicators.
    pub fn new(y: Vec<f64>, d: Vec<f64>) -> Result<Self, DiagnosticsError> {
        if y.len() != d.len() {
            return Err(DiagnosticsError::DimensionMismatch(
                "treatment vector length".to_string(),
                y.len(),
                d.len(),
            ));
        }
        for (i, v) in d.iter().enumerate() {
            if *v != 0.0 && *v != 1.0 {
                return Err(DiagnosticsError::InvalidTreatment(i, *v));
            }
        }
        Ok(ObservationSet { y, d })
    }

    /// Create an observation set from a list of treatment columns.
    ///
    /// The diagnostics in this crate are defined for a single binary
    /// treatment only; passing more than one treatment column is an error.
    pub fn from_treatment_columns(y: Vec<f64>, d_cols: Vec<Vec<f64>>) -> Result<Self, DiagnosticsError> {
        if d_cols.len() != 1 {
            return Err(DiagnosticsError::DimensionMismatch(
                "treatment columns".to_string(),
                1,
                d_cols.len(),
            ));
        }
        let d = d_cols.into_iter().next().unwrap();
        Self::new(y, d)
    }

    /// Observed outcomes.
    pub fn outcomes(&self) -> &[f64] {
        &self.y
    }

    /// Treatment indicators.
    pub fn treatments(&self) -> &[f64] {
        &self.d
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the observation set is empty.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of treated observations.
    pub fn n_treated(&self) -> usize {
        self.d.iter().filter(|v| **v == 1.0).count()
    }
}

/// Contiguous column major matrix of nuisance predictions.
///
/// Rows index observations, columns index independent cross-fitting
/// repetitions. The matrix owns its data and is immutable after creation;
/// column slicing is cheap since repetitions are stored contiguously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionMatrix {
    /// The raw data stored in a single vector, column major.
    pub data: Vec<f64>,
    /// Number of rows (observations) in the matrix.
    pub rows: usize,
    /// Number of columns (cross-fitting repetitions) in the matrix.
    pub n_reps: usize,
}

impl PredictionMatrix {
    /// Create a new PredictionMatrix.
    ///
    /// * `data` - Predictions in column major order, length `rows * n_reps`.
    /// * `rows` - Number of observations.
    /// * `n_reps` - Number of cross-fitting repetitions.
    pub fn new(data: Vec<f64>, rows: usize, n_reps: usize) -> Result<Self, DiagnosticsError> {
        if n_reps == 0 {
            return Err(DiagnosticsError::InvalidParameter(
                "n_reps".to_string(),
                "a positive repetition count".to_string(),
                "0".to_string(),
            ));
        }
        if data.len() != rows * n_reps {
            return Err(DiagnosticsError::DimensionMismatch(
                "prediction data length".to_string(),
                rows * n_reps,
                data.len(),
            ));
        }
        Ok(PredictionMatrix { data, rows, n_reps })
    }

    /// Create a matrix holding a single repetition.
    pub fn from_single_rep(preds: Vec<f64>) -> Result<Self, DiagnosticsError> {
        let rows = preds.len();
        Self::new(preds, rows, 1)
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `r` - The rth repetition of the data to get.
    pub fn get(&self, i: usize, r: usize) -> &f64 {
        &self.data[r * self.rows + i]
    }

    /// Get the prediction column for a single repetition.
    ///
    /// * `rep` - The index of the repetition to get.
    pub fn get_rep(&self, rep: usize) -> &[f64] {
        &self.data[rep * self.rows..(rep + 1) * self.rows]
    }
}

impl fmt::Display for PredictionMatrix {
    /// Format a PredictionMatrix.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut val = String::new();
        for i in 0..self.rows {
            for r in 0..self.n_reps {
                val.push_str(self.get(i, r).to_string().as_str());
                if r == (self.n_reps - 1) {
                    val.push('\n');
                } else {
                    val.push(' ');
                }
            }
        }
        write!(f, "{}", val)
    }
}
