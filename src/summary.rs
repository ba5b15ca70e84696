//! Propensity Summary
//!
//! Per-repetition histogram summaries of estimated propensity scores.
//!
//! Propensity scores clustering near 0 or 1 signal a violation of the
//! overlap/positivity assumption, which invalidates downstream causal
//! estimates. The summarizer buckets each repetition's predictions over the
//! fixed [0, 1] domain so the distributions can be inspected side by side,
//! one subplot per repetition. Rendering itself is left to the caller.
use crate::constants::DEFAULT_N_BUCKETS;
use crate::data::PredictionMatrix;
use crate::errors::DiagnosticsError;
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A single equal-width histogram bucket over the propensity domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Lower bound of the bucket (inclusive).
    pub lower: f64,
    /// Upper bound of the bucket (exclusive, except for the last bucket).
    pub upper: f64,
    /// Number of predictions falling in the bucket.
    pub count: usize,
}

/// Histogram of one repetition's propensity predictions.
///
/// Predictions outside [0, 1] (including NaN) fall in no bucket; they are
/// tallied in `out_of_range` so that bucket counts plus `out_of_range`
/// always equal the number of observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropensityHistogram {
    /// Bucket counts over [0, 1], in ascending bucket order.
    pub buckets: Vec<HistogramBucket>,
    /// Number of predictions outside [0, 1].
    pub out_of_range: usize,
}

impl PropensityHistogram {
    /// Total number of in-range predictions.
    pub fn n_in_range(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Serialize the histogram to a JSON string.
    pub fn json_dump(&self) -> Result<String, DiagnosticsError> {
        serde_json::to_string(self).map_err(|e| DiagnosticsError::UnableToSerialize(e.to_string()))
    }
}

/// Summarizes the distribution of estimated propensity scores, one
/// histogram per cross-fitting repetition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropensityScoreSummarizer {
    /// Number of equal-width buckets over [0, 1].
    pub n_buckets: usize,
}

impl Default for PropensityScoreSummarizer {
    fn default() -> Self {
        PropensityScoreSummarizer {
            n_buckets: DEFAULT_N_BUCKETS,
        }
    }
}

impl PropensityScoreSummarizer {
    /// Create a new summarizer with the given bucket count.
    pub fn new(n_buckets: usize) -> Result<Self, DiagnosticsError> {
        if n_buckets == 0 {
            return Err(DiagnosticsError::InvalidParameter(
                "n_buckets".to_string(),
                "a positive bucket count".to_string(),
                "0".to_string(),
            ));
        }
        Ok(PropensityScoreSummarizer { n_buckets })
    }

    /// Bucket each repetition's predictions over [0, 1].
    ///
    /// Returns one histogram per repetition, in repetition order.
    ///
    /// * `m` - Estimated treatment probabilities, shape [n, repetitions].
    pub fn summarize(&self, m: &PredictionMatrix) -> Vec<PropensityHistogram> {
        let histograms: Vec<PropensityHistogram> = (0..m.n_reps)
            .into_par_iter()
            .map(|r| self.summarize_rep(m.get_rep(r)))
            .collect();
        let out_of_range: usize = histograms.iter().map(|h| h.out_of_range).sum();
        if out_of_range > 0 {
            warn!(
                "{} propensity predictions fall outside [0, 1] and were excluded from all buckets.",
                out_of_range
            );
        }
        histograms
    }

    fn summarize_rep(&self, preds: &[f64]) -> PropensityHistogram {
        let width = 1.0 / self.n_buckets as f64;
        let mut counts = vec![0_usize; self.n_buckets];
        let mut out_of_range = 0;
        for p in preds {
            if *p < 0.0 || *p > 1.0 || p.is_nan() {
                out_of_range += 1;
                continue;
            }
            // 1.0 lands in the last bucket; all other buckets are half-open.
            let idx = ((*p * self.n_buckets as f64) as usize).min(self.n_buckets - 1);
            counts[idx] += 1;
        }
        let buckets = counts
            .iter()
            .enumerate()
            .map(|(i, count)| HistogramBucket {
                lower: i as f64 * width,
                upper: (i + 1) as f64 * width,
                count: *count,
            })
            .collect();
        PropensityHistogram { buckets, out_of_range }
    }
}
