//! A stateful model object which holds a signal and the result of fitting it.
use crate::decompose::{
    FitConfig, FitError, ModelResult, ParamKind, PeakModelFitter, SignalArgs,
};

/// Holds one prepared signal along with its most recent [`ModelResult`].
///
/// ```rust
/// use erpsignal::arrayops::gridspace;
/// use erpsignal::decompose::{gaussian_function, FitConfig};
/// use erpsignal::peak::GaussianParams;
/// use erpsignal::PeakModel;
///
/// let time = gridspace(0.0, 1.0, 0.001);
/// let signal = gaussian_function(&time, &[GaussianParams::new(0.4, 2.0, 0.05)]);
///
/// let mut model = PeakModel::new(FitConfig::default().peak_width_limits(0.01, 0.5).min_peak_height(0.1));
/// model.add_data(&time, &signal, None).unwrap();
/// model.fit().unwrap();
/// assert!(model.has_model());
/// assert_eq!(model.n_peaks(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct PeakModel {
    pub config: FitConfig,
    data: Option<SignalArgs<'static, 'static>>,
    result: Option<ModelResult>,
}

impl PeakModel {
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            data: None,
            result: None,
        }
    }

    /// Validate and store a signal, discarding any previous fit.
    ///
    /// # Errors
    /// Any validation error from [`SignalArgs::prepare`]
    pub fn add_data(
        &mut self,
        time: &[f64],
        signal: &[f64],
        time_range: Option<(f64, f64)>,
    ) -> Result<(), FitError> {
        let data = SignalArgs::prepare(
            time,
            signal,
            time_range,
            self.config.rectify,
            &self.config.run_mode,
        )?;
        self.data = Some(data.into_owned());
        self.result = None;
        Ok(())
    }

    /// Fit the stored signal.
    ///
    /// # Errors
    /// [`FitError::NoData`] if no signal has been added, otherwise as
    /// [`PeakModelFitter::fit_args`]
    pub fn fit(&mut self) -> Result<&ModelResult, FitError> {
        let data = self.data.as_ref().ok_or(FitError::NoData)?;
        let fitter = PeakModelFitter::new(self.config.clone());
        let result = fitter.fit_args(data)?;
        Ok(self.result.insert(result))
    }

    /// Add a signal and fit it in one step
    pub fn fit_signal(
        &mut self,
        time: &[f64],
        signal: &[f64],
        time_range: Option<(f64, f64)>,
    ) -> Result<&ModelResult, FitError> {
        self.add_data(time, signal, time_range)?;
        self.fit()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn has_model(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.has_model())
    }

    pub fn n_peaks(&self) -> usize {
        self.result.as_ref().map(|r| r.n_peaks()).unwrap_or_default()
    }

    pub fn data(&self) -> Option<&SignalArgs<'static, 'static>> {
        self.data.as_ref()
    }

    pub fn result(&self) -> Option<&ModelResult> {
        self.result.as_ref()
    }

    /// Read fitted parameters from the current model.
    ///
    /// # Errors
    /// [`FitError::NoModel`] if there is no usable fit, or as [`ModelResult::get_params`]
    pub fn get_params(
        &self,
        kind: ParamKind,
        column: Option<usize>,
    ) -> Result<Vec<Vec<f64>>, FitError> {
        match self.result.as_ref() {
            Some(result) if result.has_model() => result.get_params(kind, column),
            _ => Err(FitError::NoModel),
        }
    }

    /// Re-evaluate the fitted peaks over the stored time axis
    pub fn regenerate(&self) -> Result<Vec<f64>, FitError> {
        match (self.data.as_ref(), self.result.as_ref()) {
            (Some(data), Some(result)) => Ok(result.regenerate(&data.time)),
            (None, _) => Err(FitError::NoData),
            (_, None) => Err(FitError::NoModel),
        }
    }

    /// Drop the stored signal and fit
    pub fn reset(&mut self) {
        self.data = None;
        self.result = None;
    }
}
