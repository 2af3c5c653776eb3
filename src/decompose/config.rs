use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::FitError;
use crate::arrayops::mean;

/// The error measure used to summarize how far the model is from the signal.
///
/// This is only a post-hoc measure; the solver always minimizes squared error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorMetric {
    /// Mean absolute error
    #[default]
    MAE,
    /// Mean squared error
    MSE,
    /// Root mean squared error
    RMSE,
}

impl ErrorMetric {
    /// Compute the error between `observed` and `predicted`
    pub fn compute(&self, observed: &[f64], predicted: &[f64]) -> f64 {
        let residuals: Vec<f64> = observed
            .iter()
            .zip(predicted.iter())
            .map(|(y, yhat)| y - yhat)
            .collect();
        match self {
            Self::MAE => mean(&residuals.iter().map(|r| r.abs()).collect::<Vec<_>>()),
            Self::MSE => mean(&residuals.iter().map(|r| r.powi(2)).collect::<Vec<_>>()),
            Self::RMSE => mean(&residuals.iter().map(|r| r.powi(2)).collect::<Vec<_>>()).sqrt(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MAE => "MAE",
            Self::MSE => "MSE",
            Self::RMSE => "RMSE",
        }
    }
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorMetric {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAE" => Ok(Self::MAE),
            "MSE" => Ok(Self::MSE),
            "RMSE" => Ok(Self::RMSE),
            _ => Err(FitError::UnknownErrorMetric(s.to_string())),
        }
    }
}

/// Per-call switches controlling error propagation and input checking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunMode {
    /// Raise fit failures to the caller instead of returning an empty model
    pub debug: bool,
    /// Reject time values which are not evenly spaced
    pub check_times: bool,
    /// Reject signals containing NaN or infinite values when data are added
    pub check_data: bool,
}

impl Default for RunMode {
    fn default() -> Self {
        Self {
            debug: false,
            check_times: true,
            check_data: true,
        }
    }
}

/// Settings for decomposing a signal into gaussian peaks
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitConfig {
    /// Limits on the two-sided peak width, as `(lower, upper)`, in time units
    pub peak_width_limits: (f64, f64),
    /// The maximum number of peaks to fit
    pub max_n_peaks: usize,
    /// Absolute threshold for detecting peaks, in signal units
    pub min_peak_height: f64,
    /// Relative threshold for detecting peaks, in units of the working signal's standard deviation
    pub peak_threshold: f64,
    /// Fit the absolute value of the signal
    pub rectify: bool,
    /// The post-hoc error measure to report
    pub error_metric: ErrorMetric,

    /// Distance from the edge of the time range, in standard deviations, within which
    /// a candidate peak is dropped
    pub edge_threshold: f64,
    /// Degree of overlap, in standard deviations, between two candidates at which the
    /// shorter one is dropped
    pub overlap_threshold: f64,
    /// Bound on the center shift during fitting, in units of the guess's two-sided width
    pub center_bound: f64,
    /// The maximum number of model evaluations the solver may spend
    pub max_evaluations: usize,

    pub run_mode: RunMode,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            peak_width_limits: (0.5, 12.0),
            max_n_peaks: usize::MAX,
            min_peak_height: 0.0,
            peak_threshold: 2.0,
            rectify: false,
            error_metric: ErrorMetric::MAE,
            edge_threshold: 1.0,
            overlap_threshold: 0.75,
            center_bound: 1.5,
            max_evaluations: 500,
            run_mode: RunMode::default(),
        }
    }
}

impl FitConfig {
    /// Limits on the two-sided peak width, as `(lower, upper)`
    pub fn peak_width_limits(mut self, lower: f64, upper: f64) -> Self {
        self.peak_width_limits = (lower, upper);
        self
    }

    /// The maximum number of peaks to fit
    pub fn max_n_peaks(mut self, max_n_peaks: usize) -> Self {
        self.max_n_peaks = max_n_peaks;
        self
    }

    /// Absolute threshold for detecting peaks
    pub fn min_peak_height(mut self, min_peak_height: f64) -> Self {
        self.min_peak_height = min_peak_height;
        self
    }

    /// Relative threshold for detecting peaks
    pub fn peak_threshold(mut self, peak_threshold: f64) -> Self {
        self.peak_threshold = peak_threshold;
        self
    }

    pub fn rectify(mut self, rectify: bool) -> Self {
        self.rectify = rectify;
        self
    }

    pub fn error_metric(mut self, error_metric: ErrorMetric) -> Self {
        self.error_metric = error_metric;
        self
    }

    /// The maximum number of model evaluations the solver may spend
    pub fn max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.run_mode.debug = debug;
        self
    }

    pub fn check_times(mut self, check_times: bool) -> Self {
        self.run_mode.check_times = check_times;
        self
    }

    pub fn check_data(mut self, check_data: bool) -> Self {
        self.run_mode.check_data = check_data;
        self
    }

    /// The peak width limits converted to limits on the gaussian standard deviation
    pub fn gauss_std_limits(&self) -> (f64, f64) {
        (self.peak_width_limits.0 / 2.0, self.peak_width_limits.1 / 2.0)
    }

    /// Check that these settings describe a fittable model
    pub fn validate(&self) -> Result<(), FitError> {
        let (lo, hi) = self.peak_width_limits;
        if !(lo.is_finite() && hi.is_finite()) || lo <= 0.0 || lo > hi {
            return Err(FitError::InvalidSettings(format!(
                "peak width limits must be positive, finite and ordered, got ({lo}, {hi})"
            )));
        }
        if self.peak_threshold.is_nan() || self.min_peak_height.is_nan() {
            return Err(FitError::InvalidSettings(
                "peak thresholds must not be NaN".to_string(),
            ));
        }
        if self.max_evaluations == 0 {
            return Err(FitError::InvalidSettings(
                "the solver needs at least one model evaluation".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_metric_from_str() {
        assert_eq!("MSE".parse::<ErrorMetric>().unwrap(), ErrorMetric::MSE);
        assert_eq!(
            "MEDIAN".parse::<ErrorMetric>(),
            Err(FitError::UnknownErrorMetric("MEDIAN".to_string()))
        );
    }

    #[test]
    fn test_error_metrics() {
        let observed = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.0, 1.0, 5.0, 4.0];
        assert!((ErrorMetric::MAE.compute(&observed, &predicted) - 0.75).abs() < 1e-12);
        assert!((ErrorMetric::MSE.compute(&observed, &predicted) - 1.25).abs() < 1e-12);
        assert!((ErrorMetric::RMSE.compute(&observed, &predicted) - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(FitConfig::default().validate().is_ok());
        assert!(FitConfig::default()
            .peak_width_limits(2.0, 1.0)
            .validate()
            .is_err());
        assert!(FitConfig::default()
            .peak_width_limits(0.0, 1.0)
            .validate()
            .is_err());
        assert_eq!(FitConfig::default().gauss_std_limits(), (0.25, 6.0));
    }
}
