use log::{debug, info, warn};

use super::{
    detect::find_candidates,
    filter::{drop_peak_edge, drop_peak_overlap},
    gaussian_function,
    solver::fit_peak_guess,
    FitConfig, FitError, ModelResult, SignalArgs,
};
use crate::arrayops::{argmax_abs, pearson_r};
use crate::peak::{GaussianParams, PeakParams, PeakRecord};
use crate::peak_statistics::compute_shape_params;

/// Decompose signals into a sum of gaussian peaks under one [`FitConfig`].
///
/// Each call to [`PeakModelFitter::fit`] owns its own working copy of the signal, so a
/// single fitter may be shared between threads.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PeakModelFitter {
    pub config: FitConfig,
}

impl PeakModelFitter {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Validate `time` and `signal`, optionally restricted to `time_range`, and fit them.
    ///
    /// # Errors
    /// Invalid settings and malformed input are always returned. A [`FitError::FitFailed`]
    /// is only returned when [`RunMode::debug`](super::RunMode::debug) is set; otherwise the
    /// failure is logged and [`ModelResult::empty`] is returned in its place.
    pub fn fit(
        &self,
        time: &[f64],
        signal: &[f64],
        time_range: Option<(f64, f64)>,
    ) -> Result<ModelResult, FitError> {
        let data = SignalArgs::prepare(
            time,
            signal,
            time_range,
            self.config.rectify,
            &self.config.run_mode,
        )?;
        self.fit_args(&data)
    }

    /// Fit an already prepared signal, applying the same failure policy as [`PeakModelFitter::fit`]
    ///
    /// # Errors
    /// [`FitError::InvalidSettings`] if the configuration fails [`FitConfig::validate`]
    pub fn fit_args(&self, data: &SignalArgs) -> Result<ModelResult, FitError> {
        self.config.validate()?;
        match self.fit_inner(data) {
            Ok(result) => Ok(result),
            Err(e) if e.is_fit_failure() && !self.config.run_mode.debug => {
                warn!("{e}, no model was produced");
                Ok(ModelResult::empty())
            }
            Err(e) => Err(e),
        }
    }

    fn fit_inner(&self, data: &SignalArgs) -> Result<ModelResult, FitError> {
        if data.is_empty() {
            return Err(FitError::NoData);
        }
        if data.has_non_finite() {
            return Err(FitError::FitFailed(
                "the input data contains NaNs or Infs".to_string(),
            ));
        }

        if 1.5 * data.resolution >= self.config.peak_width_limits.0 {
            warn!(
                "The lower peak width limit {} is too close to the sampling resolution {}, \
                 consider raising it to at least twice the resolution",
                self.config.peak_width_limits.0, data.resolution
            );
        }

        let (guesses, reason) = find_candidates(data, &self.config);
        let n_found = guesses.len();
        let guesses = drop_peak_edge(guesses, data.time_range, self.config.edge_threshold);
        let guesses = drop_peak_overlap(guesses, self.config.overlap_threshold);
        debug!(
            "{} of {n_found} candidate peaks survived filtering, detection stopped by {reason:?}",
            guesses.len()
        );

        let gaussians = fit_peak_guess(data, &guesses, &self.config)?;
        let peaks = self.build_records(data, &gaussians);
        let result = self.score(data, peaks);

        info!(
            "Fit {} peaks with R^2 = {:.4} and {} = {:.4}",
            result.n_peaks(),
            result.r_squared,
            self.config.error_metric,
            result.error
        );
        Ok(result)
    }

    /// Read the peak location and amplitude off of the signal near `gaussian`.
    ///
    /// The sample of greatest magnitude within `center ± std * overlap_threshold` is used,
    /// or the sample nearest the center when that window holds no samples.
    pub fn derive_peak_params(&self, data: &SignalArgs, gaussian: &GaussianParams) -> PeakParams {
        let (lo, hi) = gaussian.span(self.config.overlap_threshold);
        let window = data.window(lo, hi);
        let offset = window.start;
        let (index, amplitude) = argmax_abs(&data.signal[window])
            .map(|(i, v)| (i + offset, v))
            .unwrap_or_else(|| {
                let i = data.find_time(gaussian.center);
                (i, data.signal[i])
            });
        PeakParams::new(data.time[index], amplitude, 2.0 * gaussian.std)
    }

    /// Derive the peak and shape parameters of every fitted gaussian, discarding those
    /// whose half-magnitude crossings could not be found.
    pub fn build_records(&self, data: &SignalArgs, gaussians: &[GaussianParams]) -> Vec<PeakRecord> {
        let mut records: Vec<PeakRecord> = gaussians
            .iter()
            .map(|gaussian| {
                let peak = self.derive_peak_params(data, gaussian);
                let peak_index = data.find_time(peak.center_time);
                let (shape, crossings) =
                    compute_shape_params(&data.time, &data.signal, peak_index, peak.amplitude);
                PeakRecord::new(*gaussian, peak, shape, crossings)
            })
            .collect();

        let n = records.len();
        records.retain(|record| {
            if !record.has_shape() {
                debug!("Dropping {record}, its half-magnitude crossings were not found");
            }
            record.has_shape()
        });
        if records.len() < n {
            debug!("{} peaks dropped for lacking a resolvable shape", n - records.len());
        }
        records
    }

    /// Reconstruct the signal from `peaks` and measure how well it matches.
    ///
    /// `R²` is undefined, `NaN`, when either the signal or the reconstruction is constant.
    pub fn score(&self, data: &SignalArgs, peaks: Vec<PeakRecord>) -> ModelResult {
        let gaussians: Vec<GaussianParams> = peaks.iter().map(|p| p.gaussian).collect();
        let peak_fit = gaussian_function(&data.time, &gaussians);
        let r_squared = pearson_r(&data.signal, &peak_fit).powi(2);
        let error = self.config.error_metric.compute(&data.signal, &peak_fit);
        ModelResult::new(peaks, r_squared, error, peak_fit)
    }
}
