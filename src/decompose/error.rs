use thiserror::Error;

/// All the ways fitting a peak model can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("No data available to fit, can not proceed")]
    NoData,
    #[error("The time array ({time}) and signal array ({signal}) do not match in length")]
    InconsistentData { time: usize, signal: usize },
    #[error("The input data are malformed: {0}")]
    MalformedData(String),
    #[error("The input time values are not evenly spaced")]
    NonUniformSpacing,
    #[error("The input data contains NaNs or Infs")]
    NonFiniteData,
    #[error("Model fitting failed: {0}")]
    FitFailed(String),
    #[error("Error metric '{0}' not understood or not implemented")]
    UnknownErrorMetric(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("No model fit results are available")]
    NoModel,
}

impl FitError {
    /// Whether this error describes a property of the data encountered while solving,
    /// rather than a setup mistake.
    pub fn is_fit_failure(&self) -> bool {
        matches!(self, Self::FitFailed(_))
    }
}
