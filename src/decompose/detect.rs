//! Greedy iterative search for candidate peaks in a residual signal.
use log::{debug, trace};

use super::{FitConfig, SignalArgs};
use crate::arrayops::{argmax_abs, mean, std_dev};
use crate::peak::GaussianParams;
use crate::peak_statistics::compute_gauss_std;

/// Why [`find_candidates`] stopped searching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured maximum number of peaks was reached
    MaxPeaks,
    /// The largest remaining point fell below the relative threshold
    RelativeThreshold,
    /// The largest remaining point fell below the absolute minimum height
    MinimumHeight,
}

/// Estimate the one-sided half width of the peak at `index` in `signal`, in samples.
///
/// Walks outwards from `index` to the first sample on each side which has returned to
/// half of `height`, and takes the shorter of the two distances so that a neighboring
/// overlapping peak does not inflate the estimate. The backwards walk stops before the
/// first sample.
///
/// Returns `None` if neither side returns to half height.
pub fn shortest_half_width(signal: &[f64], index: usize, height: f64) -> Option<usize> {
    let half_height = 0.5 * height;
    let positive = height >= 0.0;
    let returned = |v: f64| if positive { v <= half_height } else { v >= half_height };

    let left = (1..index).rev().find(|i| returned(signal[*i]));
    let right = ((index + 1)..signal.len()).find(|i| returned(signal[*i]));

    [left, right]
        .into_iter()
        .flatten()
        .map(|i| i.abs_diff(index))
        .min()
}

/// Build the initial guess for a peak at `index` of the working signal.
///
/// The standard deviation is estimated from the shortest half width at half magnitude.
/// When no half-magnitude point exists on either side, the guess falls back to the mean
/// of the two-sided peak width limits. Either way the estimate is clamped into the
/// configured standard deviation limits.
pub fn guess_peak(
    time: &[f64],
    working: &[f64],
    index: usize,
    resolution: f64,
    config: &FitConfig,
) -> GaussianParams {
    let height = working[index];
    let center = time[index];

    let guess_std = match shortest_half_width(working, index, height) {
        Some(short_side) => {
            let fwhm = short_side as f64 * 2.0 * resolution;
            compute_gauss_std(fwhm)
        }
        None => {
            let (lo, hi) = config.peak_width_limits;
            let fallback = mean(&[lo, hi]);
            debug!("No half height found around {center}, falling back to std guess {fallback}");
            fallback
        }
    };

    let (std_lo, std_hi) = config.gauss_std_limits();
    let guess_std = guess_std.clamp(std_lo, std_hi);

    GaussianParams::new(center, height, guess_std)
}

/// Iteratively find candidate peaks in `data`.
///
/// Each pass takes the point of greatest magnitude in the working copy of the signal,
/// stops if it does not clear either the relative (`peak_threshold` standard deviations)
/// or absolute (`min_peak_height`) threshold, and otherwise guesses a gaussian there and
/// subtracts it from the working signal. Candidates are returned in the order they were
/// found, by descending residual magnitude.
pub fn find_candidates(data: &SignalArgs, config: &FitConfig) -> (Vec<GaussianParams>, StopReason) {
    let time = data.time.as_ref();
    let mut working: Vec<f64> = data.signal.to_vec();
    let mut guesses = Vec::new();

    let reason = loop {
        if guesses.len() >= config.max_n_peaks {
            break StopReason::MaxPeaks;
        }

        let Some((index, height)) = argmax_abs(&working) else {
            break StopReason::RelativeThreshold;
        };
        let magnitude = height.abs();

        let threshold = config.peak_threshold * std_dev(&working);
        if !(magnitude > threshold) {
            trace!("Extreme {magnitude:0.4} does not exceed relative threshold {threshold:0.4}");
            break StopReason::RelativeThreshold;
        }

        if !(magnitude > config.min_peak_height) {
            trace!(
                "Extreme {magnitude:0.4} does not exceed minimum height {}",
                config.min_peak_height
            );
            break StopReason::MinimumHeight;
        }

        let guess = guess_peak(time, &working, index, data.resolution, config);
        debug!("Candidate peak {}: {guess}", guesses.len());

        working
            .iter_mut()
            .zip(time.iter())
            .for_each(|(y, t)| *y -= guess.density(*t));
        guesses.push(guess);
    };

    debug!("Found {} candidate peaks, stopped by {reason:?}", guesses.len());
    (guesses, reason)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decompose::{gaussian_function, RunMode};
    use crate::test_data::time_axis;

    fn prepare<'a>(time: &'a [f64], signal: &'a [f64]) -> SignalArgs<'a, 'a> {
        SignalArgs::prepare(time, signal, None, false, &RunMode::default()).unwrap()
    }

    #[test]
    fn test_shortest_half_width() {
        let signal = [0.0, 1.0, 6.0, 10.0, 8.0, 7.0, 6.0, 4.0];
        assert_eq!(shortest_half_width(&signal, 3, 10.0), Some(2));
        let signal = [0.0, -6.0, -10.0, -2.0];
        assert_eq!(shortest_half_width(&signal, 2, -10.0), Some(1));
        assert_eq!(shortest_half_width(&[10.0, 9.0, 8.0], 0, 10.0), None);
    }

    #[test]
    fn test_guess_falls_back_to_width_limits() {
        let time = [0.0, 0.1, 0.2];
        let working = [10.0, 9.0, 8.0];
        let config = FitConfig::default().peak_width_limits(0.1, 0.5);
        let guess = guess_peak(&time, &working, 0, 0.1, &config);
        // mean of the width limits, 0.3, clamped into the std limits (0.05, 0.25)
        assert_eq!(guess.std, 0.25);
        assert_eq!(guess.height, 10.0);
    }

    #[test]
    fn test_flat_signal_has_no_candidates() {
        let time = time_axis();
        let signal = vec![0.0; time.len()];
        let data = prepare(&time, &signal);
        let (guesses, reason) = find_candidates(&data, &FitConfig::default());
        assert!(guesses.is_empty());
        assert_eq!(reason, StopReason::RelativeThreshold);
    }

    #[test]
    fn test_relative_threshold_stops_search() {
        let time = time_axis();
        // A tall bump riding on a ripple whose crests stay below two standard deviations
        // of what remains once the bump is subtracted
        let signal: Vec<f64> = gaussian_function(&time, &[GaussianParams::new(0.3, 3.0, 0.02)])
            .into_iter()
            .zip(time.iter())
            .map(|(y, t)| y + 0.2 * (2.0 * std::f64::consts::PI * 10.0 * t).cos())
            .collect();
        let data = prepare(&time, &signal);
        let config = FitConfig::default()
            .peak_width_limits(0.01, 0.2)
            .min_peak_height(0.0);
        let (guesses, reason) = find_candidates(&data, &config);
        assert_eq!(guesses.len(), 1);
        assert!((guesses[0].center - 0.3).abs() < 1e-6);
        assert_eq!(reason, StopReason::RelativeThreshold);
    }

    #[test]
    fn test_respects_max_peaks() {
        let time = time_axis();
        let signal = gaussian_function(
            &time,
            &[
                GaussianParams::new(0.2, 3.0, 0.02),
                GaussianParams::new(0.5, -2.0, 0.03),
                GaussianParams::new(0.8, 1.5, 0.02),
            ],
        );
        let data = prepare(&time, &signal);
        let config = FitConfig::default()
            .peak_width_limits(0.01, 0.2)
            .max_n_peaks(2);
        let (guesses, reason) = find_candidates(&data, &config);
        assert_eq!(guesses.len(), 2);
        assert_eq!(reason, StopReason::MaxPeaks);
        // Discovery is by descending magnitude, and tracks sign
        assert!((guesses[0].center - 0.2).abs() < 1e-9);
        assert!((guesses[1].center - 0.5).abs() < 1e-9);
        assert!(guesses[1].height < 0.0);
    }

    #[test]
    fn test_minimum_height_stops_search() {
        let time = time_axis();
        let signal = gaussian_function(
            &time,
            &[
                GaussianParams::new(0.3, 3.0, 0.02),
                GaussianParams::new(0.7, 1.0, 0.02),
            ],
        );
        let data = prepare(&time, &signal);
        let config = FitConfig::default()
            .peak_width_limits(0.01, 0.2)
            .peak_threshold(0.5)
            .min_peak_height(2.0);
        let (guesses, reason) = find_candidates(&data, &config);
        assert_eq!(guesses.len(), 1);
        assert_eq!(reason, StopReason::MinimumHeight);
    }
}
