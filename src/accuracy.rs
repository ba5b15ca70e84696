//! Nuisance Accuracy
//!
//! Per-repetition accuracy evaluation of fitted nuisance predictions.
//!
//! In a double/debiased machine learning (DML) pipeline the causal estimate
//! is only as good as the cross-fitted nuisance models behind it. This
//! module scores those models separately for every cross-fitting
//! repetition: outcome regressions with root mean squared error, propensity
//! scores with binary log loss.
//!
//! Outcome regressions are fitted per treatment arm, so the treated-arm and
//! control-arm predictions are blended per observation by the observed
//! treatment indicator before scoring against the outcome.
use crate::constants::DEFAULT_CLAMP_EPS;
use crate::data::{ObservationSet, PredictionMatrix};
use crate::errors::DiagnosticsError;
use crate::metrics::{binary_log_loss, is_comparison_better, root_mean_squared_error, Metric};
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A nuisance accuracy request, naming the component to score.
///
/// The two computation paths are distinguished statically rather than by a
/// runtime mode flag.
#[derive(Debug, Clone, Copy)]
pub enum AccuracyRequest<'a> {
    /// Score the outcome regressions of both treatment arms.
    Regression {
        /// Control-arm predictions, E[Y | D=0, X], shape [n, repetitions].
        g0: &'a PredictionMatrix,
        /// Treated-arm predictions, E[Y | D=1, X], shape [n, repetitions].
        g1: &'a PredictionMatrix,
    },
    /// Score the propensity score, P(D=1 | X).
    Propensity {
        /// Estimated treatment probabilities, shape [n, repetitions].
        m: &'a PredictionMatrix,
    },
}

impl AccuracyRequest<'_> {
    /// The metric used to score this request.
    pub fn metric(&self) -> Metric {
        match self {
            AccuracyRequest::Regression { .. } => Metric::RootMeanSquaredError,
            AccuracyRequest::Propensity { .. } => Metric::LogLoss,
        }
    }
}

/// Policy for propensity predictions at or beyond the probability bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ClampPolicy {
    /// Clamp probabilities into `[eps, 1 - eps]` before taking logs.
    Clamp(f64),
    /// Clamp, but fail on a probability that is exactly 0 or 1.
    Strict(f64),
}

impl ClampPolicy {
    fn eps(&self) -> f64 {
        match self {
            ClampPolicy::Clamp(eps) | ClampPolicy::Strict(eps) => *eps,
        }
    }
}

impl Default for ClampPolicy {
    fn default() -> Self {
        ClampPolicy::Clamp(DEFAULT_CLAMP_EPS)
    }
}

/// Scores fitted nuisance predictions against the observed data, one metric
/// value per cross-fitting repetition.
///
/// The evaluator is stateless apart from its clamp policy; results are
/// recomputed on every call and never cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NuisanceAccuracyEvaluator {
    /// Policy for degenerate propensity predictions.
    pub clamp_policy: ClampPolicy,
}

impl NuisanceAccuracyEvaluator {
    /// Create a new evaluator with the given clamp policy.
    pub fn new(clamp_policy: ClampPolicy) -> Self {
        NuisanceAccuracyEvaluator { clamp_policy }
    }

    /// Compute the per-repetition accuracy of a nuisance component.
    ///
    /// Returns one metric value per repetition, in repetition order.
    ///
    /// * `obs` - The observation set the nuisance models were fitted on.
    /// * `request` - The nuisance component to score.
    pub fn evaluate(&self, obs: &ObservationSet, request: AccuracyRequest) -> Result<Vec<f64>, DiagnosticsError> {
        let n = obs.len();
        if n == 0 {
            return Err(DiagnosticsError::DimensionMismatch("observations".to_string(), 1, 0));
        }
        match request {
            AccuracyRequest::Regression { g0, g1 } => {
                check_rows("control-arm prediction rows", g0, n)?;
                check_rows("treated-arm prediction rows", g1, n)?;
                if g0.n_reps != g1.n_reps {
                    return Err(DiagnosticsError::DimensionMismatch(
                        "treated-arm repetitions".to_string(),
                        g0.n_reps,
                        g1.n_reps,
                    ));
                }
                Ok((0..g0.n_reps)
                    .into_par_iter()
                    .map(|r| {
                        let g0_r = g0.get_rep(r);
                        let g1_r = g1.get_rep(r);
                        let blended: Vec<f64> = obs
                            .treatments()
                            .iter()
                            .enumerate()
                            .map(|(i, d_)| if *d_ == 1.0 { g1_r[i] } else { g0_r[i] })
                            .collect();
                        root_mean_squared_error(obs.outcomes(), &blended)
                    })
                    .collect())
            }
            AccuracyRequest::Propensity { m } => {
                check_rows("propensity prediction rows", m, n)?;
                self.check_degenerate(m)?;
                let eps = self.clamp_policy.eps();
                Ok((0..m.n_reps)
                    .into_par_iter()
                    .map(|r| binary_log_loss(obs.treatments(), m.get_rep(r), eps))
                    .collect())
            }
        }
    }

    /// Compute per-repetition accuracy along with summary statistics.
    pub fn summarize(&self, obs: &ObservationSet, request: AccuracyRequest) -> Result<AccuracySummary, DiagnosticsError> {
        let metric = request.metric();
        let per_rep = self.evaluate(obs, request)?;
        Ok(AccuracySummary::from_per_rep(metric, per_rep))
    }

    fn check_degenerate(&self, m: &PredictionMatrix) -> Result<(), DiagnosticsError> {
        let strict = matches!(self.clamp_policy, ClampPolicy::Strict(_));
        let eps = self.clamp_policy.eps();
        let mut n_clamped = 0;
        for (idx, p) in m.data.iter().enumerate() {
            if strict && (*p == 0.0 || *p == 1.0) {
                return Err(DiagnosticsError::DegenerateProbability(
                    idx % m.rows,
                    idx / m.rows,
                    *p,
                ));
            }
            if *p < eps || *p > 1.0 - eps {
                n_clamped += 1;
            }
        }
        if n_clamped > 0 {
            warn!(
                "{} propensity predictions fall outside [{}, {}] and will be clamped.",
                n_clamped,
                eps,
                1.0 - eps
            );
        }
        Ok(())
    }
}

fn check_rows(name: &str, m: &PredictionMatrix, n: usize) -> Result<(), DiagnosticsError> {
    if m.rows != n {
        return Err(DiagnosticsError::DimensionMismatch(name.to_string(), n, m.rows));
    }
    Ok(())
}

/// Per-repetition accuracy values with summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracySummary {
    /// The metric the values were computed with.
    pub metric: Metric,
    /// One metric value per repetition, in repetition order.
    pub per_rep: Vec<f64>,
    /// Mean metric value across repetitions.
    pub mean: f64,
    /// Smallest metric value across repetitions.
    pub min: f64,
    /// Largest metric value across repetitions.
    pub max: f64,
    /// Index of the best repetition under the metric.
    pub best_rep: usize,
}

impl AccuracySummary {
    /// Build a summary from a per-repetition metric sequence.
    pub fn from_per_rep(metric: Metric, per_rep: Vec<f64>) -> Self {
        let mean = per_rep.iter().sum::<f64>() / per_rep.len() as f64;
        let min = per_rep.iter().copied().fold(f64::INFINITY, f64::min);
        let max = per_rep.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut best_rep = 0;
        for (r, value) in per_rep.iter().enumerate().skip(1) {
            if is_comparison_better(per_rep[best_rep], *value, metric.maximize()) {
                best_rep = r;
            }
        }
        AccuracySummary {
            metric,
            per_rep,
            mean,
            min,
            max,
            best_rep,
        }
    }

    /// Serialize the summary to a JSON string.
    pub fn json_dump(&self) -> Result<String, DiagnosticsError> {
        serde_json::to_string(self).map_err(|e| DiagnosticsError::UnableToSerialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;

    fn simple_obs() -> ObservationSet {
        ObservationSet::new(vec![1., 2., 3., 4.], vec![0., 1., 0., 1.]).unwrap()
    }

    #[test]
    fn test_regression_accuracy_single_rep() {
        let obs = simple_obs();
        let g0 = PredictionMatrix::from_single_rep(vec![1., 1., 1., 1.]).unwrap();
        let g1 = PredictionMatrix::from_single_rep(vec![2., 2., 2., 2.]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator
            .evaluate(&obs, AccuracyRequest::Regression { g0: &g0, g1: &g1 })
            .unwrap();
        assert_eq!(res.len(), 1);
        // blended = [1,2,1,2] -> sqrt(mean([0,0,4,4])) = sqrt(2)
        assert_eq!(precision_round(res[0], 4), 1.4142);
    }

    #[test]
    fn test_regression_accuracy_perfect_predictions() {
        let obs = simple_obs();
        let g0 = PredictionMatrix::from_single_rep(vec![1., 0., 3., 0.]).unwrap();
        let g1 = PredictionMatrix::from_single_rep(vec![0., 2., 0., 4.]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator
            .evaluate(&obs, AccuracyRequest::Regression { g0: &g0, g1: &g1 })
            .unwrap();
        assert_eq!(res[0], 0.0);
    }

    #[test]
    fn test_regression_accuracy_rep_order() {
        let obs = simple_obs();
        // Second repetition is perfect, first is not.
        let g0 = PredictionMatrix::new(vec![0., 0., 0., 0., 1., 0., 3., 0.], 4, 2).unwrap();
        let g1 = PredictionMatrix::new(vec![0., 0., 0., 0., 0., 2., 0., 4.], 4, 2).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator
            .evaluate(&obs, AccuracyRequest::Regression { g0: &g0, g1: &g1 })
            .unwrap();
        assert_eq!(res.len(), 2);
        assert!(res[0] > 0.0);
        assert_eq!(res[1], 0.0);
    }

    #[test]
    fn test_propensity_accuracy() {
        let obs = ObservationSet::new(vec![0., 0.], vec![0., 1.]).unwrap();
        let m = PredictionMatrix::from_single_rep(vec![0.1, 0.9]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator.evaluate(&obs, AccuracyRequest::Propensity { m: &m }).unwrap();
        assert_eq!(precision_round(res[0], 5), 0.10536);
    }

    #[test]
    fn test_propensity_accuracy_clamped() {
        let obs = ObservationSet::new(vec![0., 0.], vec![0., 1.]).unwrap();
        let m = PredictionMatrix::from_single_rep(vec![1.0, 0.0]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator.evaluate(&obs, AccuracyRequest::Propensity { m: &m }).unwrap();
        assert!(res[0].is_finite());
        assert!(res[0] >= 0.0);
    }

    #[test]
    fn test_propensity_accuracy_strict_policy() {
        let obs = ObservationSet::new(vec![0., 0.], vec![0., 1.]).unwrap();
        let m = PredictionMatrix::from_single_rep(vec![0.5, 1.0]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::new(ClampPolicy::Strict(0.025));
        let res = evaluator.evaluate(&obs, AccuracyRequest::Propensity { m: &m });
        match res {
            Err(DiagnosticsError::DegenerateProbability(i, r, v)) => {
                assert_eq!(i, 1);
                assert_eq!(r, 0);
                assert_eq!(v, 1.0);
            }
            _ => panic!("Expected DegenerateProbability"),
        }
    }

    #[test]
    fn test_evaluate_rejects_row_mismatch() {
        let obs = simple_obs();
        let m = PredictionMatrix::from_single_rep(vec![0.5, 0.5]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator.evaluate(&obs, AccuracyRequest::Propensity { m: &m });
        assert!(matches!(res, Err(DiagnosticsError::DimensionMismatch(_, 4, 2))));
    }

    #[test]
    fn test_evaluate_rejects_rep_mismatch() {
        let obs = simple_obs();
        let g0 = PredictionMatrix::new(vec![0.; 8], 4, 2).unwrap();
        let g1 = PredictionMatrix::new(vec![0.; 4], 4, 1).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator.evaluate(&obs, AccuracyRequest::Regression { g0: &g0, g1: &g1 });
        assert!(matches!(res, Err(DiagnosticsError::DimensionMismatch(_, 2, 1))));
    }

    #[test]
    fn test_evaluate_rejects_empty_observations() {
        let obs = ObservationSet::new(vec![], vec![]).unwrap();
        let m = PredictionMatrix::from_single_rep(vec![0.5]).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let res = evaluator.evaluate(&obs, AccuracyRequest::Propensity { m: &m });
        assert!(matches!(res, Err(DiagnosticsError::DimensionMismatch(_, 1, 0))));
    }

    #[test]
    fn test_summarize() {
        let obs = simple_obs();
        let g0 = PredictionMatrix::new(vec![0., 0., 0., 0., 1., 0., 3., 0.], 4, 2).unwrap();
        let g1 = PredictionMatrix::new(vec![0., 0., 0., 0., 0., 2., 0., 4.], 4, 2).unwrap();
        let evaluator = NuisanceAccuracyEvaluator::default();
        let summary = evaluator
            .summarize(&obs, AccuracyRequest::Regression { g0: &g0, g1: &g1 })
            .unwrap();
        assert_eq!(summary.metric, Metric::RootMeanSquaredError);
        assert_eq!(summary.per_rep.len(), 2);
        assert_eq!(summary.best_rep, 1);
        assert_eq!(summary.min, 0.0);
        assert!(summary.max > 0.0);
        assert!(summary.mean > 0.0);
    }

    #[test]
    fn test_summary_json_dump() {
        let summary = AccuracySummary::from_per_rep(Metric::LogLoss, vec![0.2, 0.1]);
        let dump = summary.json_dump().unwrap();
        let parsed: AccuracySummary = serde_json::from_str(&dump).unwrap();
        assert_eq!(parsed.best_rep, 1);
        assert_eq!(parsed.per_rep, vec![0.2, 0.1]);
    }
}
