//! Metrics
//!
//! Scalar metric kernels used to score fitted nuisance predictions.
use crate::errors::DiagnosticsError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Compare to metric values, determining if b is better.
/// If one of them is NaN favor the non NaN value.
/// If both are NaN, consider the first value to be better.
pub fn is_comparison_better(value: f64, comparison: f64, maximize: bool) -> bool {
    match (value.is_nan(), comparison.is_nan()) {
        // Both nan, comparison is not better,
        // Or comparison is nan, also not better
        (true, true) | (false, true) => false,
        // comparison is not Nan, it's better
        (true, false) => true,
        // Perform numerical comparison.
        (false, false) => {
            if maximize {
                value < comparison
            } else {
                value > comparison
            }
        }
    }
}

/// Accuracy metric applied to a nuisance component.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    RootMeanSquaredError,
    LogLoss,
}

impl Metric {
    /// Whether larger values of the metric are better.
    pub fn maximize(&self) -> bool {
        match self {
            Metric::RootMeanSquaredError => false,
            Metric::LogLoss => false,
        }
    }
}

impl FromStr for Metric {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RootMeanSquaredError" => Ok(Metric::RootMeanSquaredError),
            "LogLoss" => Ok(Metric::LogLoss),

            _ => Err(DiagnosticsError::ParseString(
                s.to_string(),
                "Metric".to_string(),
                items_to_strings(vec!["RootMeanSquaredError", "LogLoss"]),
            )),
        }
    }
}

/// Root mean squared error of predictions against observed outcomes.
pub fn root_mean_squared_error(y: &[f64], yhat: &[f64]) -> f64 {
    let res = y.iter().zip(yhat).map(|(y_, yhat_)| (y_ - yhat_).powi(2)).sum::<f64>();
    (res / y.len() as f64).sqrt()
}

/// Binary log loss of predicted probabilities against observed indicators.
///
/// Probabilities are clamped into `[eps, 1 - eps]` before taking logs so
/// the loss stays finite.
pub fn binary_log_loss(d: &[f64], p: &[f64], eps: f64) -> f64 {
    let res = d
        .iter()
        .zip(p)
        .map(|(d_, p_)| {
            let p_ = p_.clamp(eps, 1.0 - eps);
            -(*d_ * p_.ln() + (1.0 - *d_) * (1.0 - p_).ln())
        })
        .sum::<f64>();
    res / d.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;

    #[test]
    fn test_root_mean_squared_error() {
        // Blended predictions from the worked single-repetition example:
        // y = [1,2,3,4], blended = [1,2,1,2] -> sqrt(mean([0,0,4,4])) = sqrt(2).
        let y = vec![1., 2., 3., 4.];
        let yhat = vec![1., 2., 1., 2.];
        let res = root_mean_squared_error(&y, &yhat);
        assert_eq!(precision_round(res, 4), 1.4142);
    }

    #[test]
    fn test_root_mean_squared_error_perfect() {
        let y = vec![1., 3., 4., 5., 2.];
        let res = root_mean_squared_error(&y, &y);
        assert_eq!(res, 0.0);
    }

    #[test]
    fn test_binary_log_loss() {
        let d = vec![0., 1.];
        let p = vec![0.1, 0.9];
        let res = binary_log_loss(&d, &p, 0.025);
        assert_eq!(precision_round(res, 5), 0.10536);
    }

    #[test]
    fn test_binary_log_loss_clamped_finite() {
        let d = vec![1., 0., 1., 0.];
        let p = vec![0., 1., 1., 0.];
        let res = binary_log_loss(&d, &p, 0.025);
        assert!(res.is_finite());
        assert!(res >= 0.0);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!(Metric::from_str("LogLoss").unwrap(), Metric::LogLoss);
        assert_eq!(
            Metric::from_str("RootMeanSquaredError").unwrap(),
            Metric::RootMeanSquaredError
        );
        assert!(Metric::from_str("Accuracy").is_err());
    }

    #[test]
    fn test_is_comparison_better() {
        assert!(is_comparison_better(1.0, 0.5, false));
        assert!(!is_comparison_better(0.5, 1.0, false));
        assert!(is_comparison_better(f64::NAN, 0.5, false));
        assert!(!is_comparison_better(0.5, f64::NAN, false));
        assert!(!is_comparison_better(f64::NAN, f64::NAN, false));
        // Ties favor the incumbent.
        assert!(!is_comparison_better(0.5, 0.5, false));
    }
}
