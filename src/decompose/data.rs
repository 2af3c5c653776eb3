use std::{borrow::Cow, iter::FusedIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{FitError, RunMode};
use crate::peak_statistics::isclose;

/// An iterator over the `(time, signal)` pairs of a [`SignalArgs`]
pub struct SignalArgsIter<'a> {
    inner: std::iter::Zip<
        std::iter::Copied<std::slice::Iter<'a, f64>>,
        std::iter::Copied<std::slice::Iter<'a, f64>>,
    >,
}

impl<'a> Iterator for SignalArgsIter<'a> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> FusedIterator for SignalArgsIter<'a> {}

impl<'a> ExactSizeIterator for SignalArgsIter<'a> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// An evenly sampled signal-over-time ready to be fit.
///
/// Constructed with [`SignalArgs::prepare`], which restricts the signal to a time range
/// and runs the input checks requested by a [`RunMode`].
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalArgs<'a, 'b> {
    /// The time axis of the signal
    pub time: Cow<'a, [f64]>,
    /// The signal values the model is fit against, rectified if requested
    pub signal: Cow<'b, [f64]>,
    /// The signal values before rectification
    pub raw_signal: Cow<'b, [f64]>,
    /// The first and last time of the signal
    pub time_range: (f64, f64),
    /// The spacing between time points
    pub resolution: f64,
}

impl<'a, 'b> SignalArgs<'a, 'b> {
    /// Validate and prepare a signal for fitting.
    ///
    /// If `time_range` is given, only samples with `lo <= t <= hi` are kept. When
    /// `rectify` is set, the fit operates on the absolute value of the signal.
    ///
    /// # Errors
    /// - [`FitError::InconsistentData`] if `time` and `signal` differ in length
    /// - [`FitError::NoData`] if no samples remain
    /// - [`FitError::MalformedData`] if fewer than two samples remain or time is not increasing
    /// - [`FitError::NonUniformSpacing`] if `run_mode.check_times` and the spacing varies
    /// - [`FitError::NonFiniteData`] if `run_mode.check_data` and the signal has NaN or Inf
    pub fn prepare(
        time: &'a [f64],
        signal: &'b [f64],
        time_range: Option<(f64, f64)>,
        rectify: bool,
        run_mode: &RunMode,
    ) -> Result<Self, FitError> {
        if time.len() != signal.len() {
            return Err(FitError::InconsistentData {
                time: time.len(),
                signal: signal.len(),
            });
        }

        let (time, raw_signal): (Cow<'a, [f64]>, Cow<'b, [f64]>) = match time_range {
            Some((lo, hi)) => {
                let (t, s): (Vec<f64>, Vec<f64>) = time
                    .iter()
                    .copied()
                    .zip(signal.iter().copied())
                    .filter(|(t, _)| *t >= lo && *t <= hi)
                    .unzip();
                (Cow::Owned(t), Cow::Owned(s))
            }
            None => (Cow::Borrowed(time), Cow::Borrowed(signal)),
        };

        if time.is_empty() {
            return Err(FitError::NoData);
        }
        if time.len() < 2 {
            return Err(FitError::MalformedData(
                "at least two samples are required to determine the sampling resolution"
                    .to_string(),
            ));
        }

        let resolution = (time[1] - time[0]).abs();

        if time.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(FitError::MalformedData(
                "time values must be strictly increasing".to_string(),
            ));
        }

        if run_mode.check_times
            && !time
                .windows(2)
                .all(|w| isclose(w[1] - w[0], resolution))
        {
            return Err(FitError::NonUniformSpacing);
        }

        if run_mode.check_data && raw_signal.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFiniteData);
        }

        let signal = if rectify {
            Cow::Owned(raw_signal.iter().map(|v| v.abs()).collect())
        } else {
            raw_signal.clone()
        };

        let time_range = (
            time.first().copied().unwrap_or_default(),
            time.last().copied().unwrap_or_default(),
        );

        Ok(Self {
            time,
            signal,
            raw_signal,
            time_range,
            resolution,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn iter(&self) -> SignalArgsIter<'_> {
        SignalArgsIter {
            inner: self
                .time
                .iter()
                .copied()
                .zip(self.signal.iter().copied()),
        }
    }

    /// The sampling frequency, `1 / resolution`
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.resolution
    }

    pub fn duration(&self) -> f64 {
        self.time_range.1 - self.time_range.0
    }

    /// Whether the signal contains any NaN or infinite values
    pub fn has_non_finite(&self) -> bool {
        self.signal.iter().any(|v| !v.is_finite())
    }

    /// Find the index nearest to `time`
    pub fn find_time(&self, time: f64) -> usize {
        let time_array = &self.time;
        let n = time_array.len().saturating_sub(1);
        let mut j = match time_array.binary_search_by(|x| x.total_cmp(&time)) {
            Ok(i) => i.min(n),
            Err(i) => i.min(n),
        };

        let i = j;
        let mut best = j;
        let err = (time_array[j] - time).abs();
        let mut best_err = err;
        let n = n + 1;
        // search backwards
        loop {
            let err = (time_array[j] - time).abs();
            if err < best_err {
                best_err = err;
                best = j;
            } else if err > best_err {
                break;
            }
            if j == 0 {
                break;
            }
            j -= 1;
        }
        j = i;
        // search forwards
        while j < n {
            let err = (time_array[j] - time).abs();
            if err < best_err {
                best_err = err;
                best = j;
            } else if err > best_err {
                break;
            }
            j += 1;
        }
        best
    }

    /// Find the index range of samples lying within `[lo, hi]`, falling back to the
    /// sample nearest the midpoint when the interval holds no samples.
    pub fn window(&self, lo: f64, hi: f64) -> std::ops::Range<usize> {
        let start = self.time.partition_point(|t| *t < lo);
        let end = self.time.partition_point(|t| *t <= hi);
        if start < end {
            start..end
        } else {
            let i = self.find_time((lo + hi) / 2.0);
            i..(i + 1)
        }
    }
}

impl<'a, 'b> SignalArgs<'a, 'b> {
    /// Produce a copy of this signal which borrows from `self`
    pub fn borrow(&self) -> SignalArgs<'_, '_> {
        SignalArgs {
            time: Cow::Borrowed(self.time.as_ref()),
            signal: Cow::Borrowed(self.signal.as_ref()),
            raw_signal: Cow::Borrowed(self.raw_signal.as_ref()),
            time_range: self.time_range,
            resolution: self.resolution,
        }
    }

    /// Copy any borrowed data so the signal no longer depends on its source
    pub fn into_owned(self) -> SignalArgs<'static, 'static> {
        SignalArgs {
            time: Cow::Owned(self.time.into_owned()),
            signal: Cow::Owned(self.signal.into_owned()),
            raw_signal: Cow::Owned(self.raw_signal.into_owned()),
            time_range: self.time_range,
            resolution: self.resolution,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arrayops::gridspace;

    #[test]
    fn test_prepare_trims_range() {
        let time = gridspace(0.0, 1.0, 0.1);
        let signal: Vec<f64> = time.iter().map(|t| t * 2.0).collect();
        let args =
            SignalArgs::prepare(&time, &signal, Some((0.25, 0.75)), false, &RunMode::default())
                .unwrap();
        assert_eq!(args.len(), 5);
        assert!((args.time_range.0 - 0.3).abs() < 1e-12);
        assert!((args.time_range.1 - 0.7).abs() < 1e-12);
        assert!((args.sampling_rate() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_prepare_errors() {
        let mode = RunMode::default();
        assert_eq!(
            SignalArgs::prepare(&[0.0, 1.0], &[1.0], None, false, &mode).unwrap_err(),
            FitError::InconsistentData { time: 2, signal: 1 }
        );
        assert_eq!(
            SignalArgs::prepare(&[], &[], None, false, &mode).unwrap_err(),
            FitError::NoData
        );
        assert_eq!(
            SignalArgs::prepare(&[0.0, 1.0, 3.0], &[0.0; 3], None, false, &mode).unwrap_err(),
            FitError::NonUniformSpacing
        );
        assert_eq!(
            SignalArgs::prepare(&[0.0, 1.0, 2.0], &[0.0, f64::NAN, 1.0], None, false, &mode)
                .unwrap_err(),
            FitError::NonFiniteData
        );
        assert!(matches!(
            SignalArgs::prepare(&[0.0, 2.0, 1.0], &[0.0; 3], None, false, &mode).unwrap_err(),
            FitError::MalformedData(_)
        ));
    }

    #[test]
    fn test_checks_can_be_disabled() {
        let mode = RunMode {
            check_times: false,
            check_data: false,
            ..RunMode::default()
        };
        let args =
            SignalArgs::prepare(&[0.0, 1.0, 3.0], &[0.0, f64::INFINITY, 1.0], None, false, &mode)
                .unwrap();
        assert!(args.has_non_finite());
    }

    #[test]
    fn test_rectify_keeps_raw() {
        let args = SignalArgs::prepare(
            &[0.0, 1.0, 2.0],
            &[1.0, -2.0, 3.0],
            None,
            true,
            &RunMode::default(),
        )
        .unwrap();
        assert_eq!(args.signal.as_ref(), &[1.0, 2.0, 3.0]);
        assert_eq!(args.raw_signal.as_ref(), &[1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_find_time_and_window() {
        let time = gridspace(0.0, 1.0, 0.1);
        let signal = vec![0.0; time.len()];
        let args = SignalArgs::prepare(&time, &signal, None, false, &RunMode::default()).unwrap();
        assert_eq!(args.find_time(0.31), 3);
        assert_eq!(args.find_time(0.36), 4);
        assert_eq!(args.find_time(-5.0), 0);
        assert_eq!(args.find_time(5.0), 9);
        assert_eq!(args.window(0.15, 0.45), 2..5);
        assert_eq!(args.window(0.31, 0.32), 3..4);
    }
}
