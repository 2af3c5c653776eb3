//! Fit many signals which share one time axis.
//!
//! Every signal is fit by its own independent pipeline. With the `parallelism` feature
//! enabled the fits are distributed over the `rayon` thread pool.
use cfg_if::cfg_if;
use log::{debug, info};

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::decompose::{FitConfig, FitError, ModelResult, PeakModelFitter, SignalArgs};

/// The results of fitting a group of signals, one entry per signal in input order.
///
/// An entry is `None` when the solver failed for that signal.
#[derive(Debug, Default, Clone)]
pub struct PeakModelGroup {
    pub config: FitConfig,
    pub results: Vec<Option<ModelResult>>,
}

cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn fit_all(
            fitter: &PeakModelFitter,
            signals: &[SignalArgs],
        ) -> Vec<Result<ModelResult, FitError>> {
            signals.par_iter().map(|data| fitter.fit_args(data)).collect()
        }
    } else {
        fn fit_all(
            fitter: &PeakModelFitter,
            signals: &[SignalArgs],
        ) -> Vec<Result<ModelResult, FitError>> {
            signals.iter().map(|data| fitter.fit_args(data)).collect()
        }
    }
}

impl PeakModelGroup {
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Fit every signal in `signals` against `time`.
    ///
    /// All signals are validated before any fitting starts, and a validation error in any
    /// of them aborts the whole call. Solver failures only empty the affected entry,
    /// unless [`RunMode::debug`](crate::decompose::RunMode::debug) is set, in which case
    /// the first failure is returned.
    pub fn fit<S: AsRef<[f64]>>(
        &mut self,
        time: &[f64],
        signals: &[S],
        time_range: Option<(f64, f64)>,
    ) -> Result<&[Option<ModelResult>], FitError> {
        self.config.validate()?;
        self.results.clear();

        let prepared = signals
            .iter()
            .map(|signal| {
                SignalArgs::prepare(
                    time,
                    signal.as_ref(),
                    time_range,
                    self.config.rectify,
                    &self.config.run_mode,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Failures are surfaced per signal and mapped to empty entries below
        let fitter = PeakModelFitter::new(self.config.clone().debug(true));
        let mut results = Vec::with_capacity(prepared.len());
        for (i, outcome) in fit_all(&fitter, &prepared).into_iter().enumerate() {
            match outcome {
                Ok(result) => results.push(Some(result)),
                Err(e) if e.is_fit_failure() && !self.config.run_mode.debug => {
                    debug!("Fit of signal {i} failed: {e}");
                    results.push(None);
                }
                Err(e) => return Err(e),
            }
        }
        self.results = results;

        info!(
            "Fit {} signals, {} failed",
            self.len(),
            self.n_failed_fits()
        );
        Ok(&self.results)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ModelResult> {
        self.results.get(index).and_then(|r| r.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ModelResult>> {
        self.results.iter().map(|r| r.as_ref())
    }

    /// The number of signals whose fit failed
    pub fn n_failed_fits(&self) -> usize {
        self.results.iter().filter(|r| r.is_none()).count()
    }

    pub fn failed_fit_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.is_none().then_some(i))
            .collect()
    }

    /// The number of peaks found in each signal, zero for failed fits
    pub fn n_peaks(&self) -> Vec<usize> {
        self.results
            .iter()
            .map(|r| r.as_ref().map(|r| r.n_peaks()).unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peak::GaussianParams;
    use crate::test_data::{bump_signal, time_axis};

    fn config() -> FitConfig {
        FitConfig::default()
            .peak_width_limits(0.01, 0.5)
            .min_peak_height(0.1)
    }

    #[test_log::test]
    fn test_group_fit() {
        let signals: Vec<Vec<f64>> = [0.3, 0.5, 0.7]
            .into_iter()
            .map(|c| bump_signal(&[GaussianParams::new(c, 1.0, 0.04)]).1)
            .collect();
        let time = time_axis();
        let mut group = PeakModelGroup::new(config());
        let results = group.fit(&time, &signals, None).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(group.n_failed_fits(), 0);
        assert_eq!(group.n_peaks(), vec![1, 1, 1]);
        for (result, c) in group.iter().zip([0.3, 0.5, 0.7]) {
            let center = result.unwrap().peaks[0].gaussian.center;
            assert!((center - c).abs() < 1e-3);
        }
    }

    #[test_log::test]
    fn test_group_failure_is_none() {
        let time = time_axis();
        let good = bump_signal(&[GaussianParams::new(0.5, 1.0, 0.04)]).1;
        let mut bad = good.clone();
        bad[100] = f64::NAN;

        let mut group = PeakModelGroup::new(config().check_data(false));
        group.fit(&time, &[good.clone(), bad.clone()], None).unwrap();
        assert_eq!(group.failed_fit_indices(), vec![1]);
        assert!(group.get(0).is_some());

        let mut group = PeakModelGroup::new(config().check_data(false).debug(true));
        assert!(group.fit(&time, &[good, bad], None).is_err());
    }

    #[test]
    fn test_group_validation_aborts() {
        let time = time_axis();
        let mut group = PeakModelGroup::new(config());
        let err = group
            .fit(&time, &[vec![0.0; time.len()], vec![0.0; 3]], None)
            .unwrap_err();
        assert!(matches!(err, FitError::InconsistentData { .. }));
        assert!(group.is_empty());
    }
}
