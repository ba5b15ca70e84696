// Modules
pub mod accuracy;
pub mod constants;
pub mod data;
pub mod errors;
pub mod metrics;
pub mod summary;
pub mod utils;

// Individual classes, and functions
pub use accuracy::{AccuracyRequest, AccuracySummary, ClampPolicy, NuisanceAccuracyEvaluator};
pub use data::{ObservationSet, PredictionMatrix};
pub use errors::DiagnosticsError;
pub use metrics::Metric;
pub use summary::{HistogramBucket, PropensityHistogram, PropensityScoreSummarizer};
