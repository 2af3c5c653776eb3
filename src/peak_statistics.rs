//! Measurements of peak shape taken directly from the digitized signal.
use num_traits::{Float, FromPrimitive};

use crate::peak::{HalfMagnitudeCrossings, ShapeParams};

pub fn _isclose<T>(x: T, y: T, rtol: T, atol: T) -> bool
where
    T: Float,
{
    (x - y).abs() <= (atol + rtol * y.abs())
}

pub fn isclose<T>(x: T, y: T) -> bool
where
    T: Float + FromPrimitive,
{
    _isclose(x, y, T::from_f64(1e-5).unwrap(), T::from_f64(1e-8).unwrap())
}

pub fn aboutzero<T>(x: T) -> bool
where
    T: Float + FromPrimitive,
{
    isclose(x, T::zero())
}

/// `2 * sqrt(2 * ln(2))`, the ratio between a gaussian's FWHM and its standard deviation
pub const FWHM_PER_STD: f64 = 2.354_820_045_030_949_3;

/// Compute the full width at half max of a gaussian with standard deviation `std`
pub fn compute_fwhm(std: f64) -> f64 {
    FWHM_PER_STD * std
}

/// Compute the standard deviation of a gaussian with full width at half max `fwhm`
pub fn compute_gauss_std(fwhm: f64) -> f64 {
    fwhm / FWHM_PER_STD
}

/// Whether `value` lies on the baseline side of `half` for a peak of sign `positive`
#[inline]
fn at_or_past_half(value: f64, half: f64, positive: bool) -> bool {
    if positive {
        value <= half
    } else {
        value >= half
    }
}

/// Locate the half-magnitude crossing points around `peak_index`.
///
/// Scans backwards for the last index before the peak which has returned to half the
/// peak's magnitude, and forwards for the first such index after it. The comparison is
/// sign aware so that negative-going peaks are measured against their own half magnitude.
///
/// Returns `None` when the signal never returns to half magnitude on one of the sides.
pub fn half_magnitude_crossings(
    signal: &[f64],
    peak_index: usize,
    amplitude: f64,
) -> Option<HalfMagnitudeCrossings> {
    if peak_index >= signal.len() {
        return None;
    }
    let half = amplitude / 2.0;
    let positive = amplitude >= 0.0;

    let start = (0..peak_index)
        .rev()
        .find(|i| at_or_past_half(signal[*i], half, positive))?;
    let end = ((peak_index + 1)..signal.len())
        .find(|i| at_or_past_half(signal[*i], half, positive))?;

    Some(HalfMagnitudeCrossings::new(start, peak_index, end))
}

/// Convert a rise or decay edge into an angle in degrees
fn edge_angle(half_magnitude: f64, duration: f64) -> f64 {
    (half_magnitude.abs() / duration).atan().to_degrees()
}

/// Compute the [`ShapeParams`] of a peak from its half-magnitude crossings.
///
/// The sharpness measures map the rise and decay edge angles onto `[0, 1]`, and
/// the combined sharpness is the complement of the apex angle relative to 180°.
pub fn shape_from_crossings(
    time: &[f64],
    amplitude: f64,
    crossings: &HalfMagnitudeCrossings,
) -> ShapeParams {
    let start_t = time[crossings.start];
    let peak_t = time[crossings.peak];
    let end_t = time[crossings.end];

    let fwhm = end_t - start_t;
    let rise_time = peak_t - start_t;
    let decay_time = end_t - peak_t;
    let symmetry = rise_time / fwhm;

    let half_magnitude = amplitude / 2.0;
    let rise_angle = edge_angle(half_magnitude, rise_time);
    let decay_angle = edge_angle(half_magnitude, decay_time);

    let sharpness_rise = rise_angle / 90.0;
    let sharpness_decay = decay_angle / 90.0;
    let sharpness = 1.0 - ((180.0 - rise_angle - decay_angle) / 180.0);

    ShapeParams {
        fwhm,
        rise_time,
        decay_time,
        symmetry,
        sharpness,
        sharpness_rise,
        sharpness_decay,
    }
}

/// Derive the shape of the peak at `peak_index`, returning the crossings that
/// bound it if they could be located.
///
/// When either crossing is missing, the shape is [`ShapeParams::undefined`].
pub fn compute_shape_params(
    time: &[f64],
    signal: &[f64],
    peak_index: usize,
    amplitude: f64,
) -> (ShapeParams, Option<HalfMagnitudeCrossings>) {
    match half_magnitude_crossings(signal, peak_index, amplitude) {
        Some(crossings) => (shape_from_crossings(time, amplitude, &crossings), Some(crossings)),
        None => (ShapeParams::undefined(), None),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arrayops::gridspace;
    use crate::peak::GaussianParams;

    #[test]
    fn test_fwhm_std_conversion() {
        let std = 1.7;
        assert!((compute_gauss_std(compute_fwhm(std)) - std).abs() < 1e-12);
        assert!((compute_fwhm(1.0) - 2.0 * (2.0 * 2f64.ln()).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_crossings_positive() {
        let signal = [0.0, 1.0, 4.0, 10.0, 6.0, 4.0, 0.0];
        let crossings = half_magnitude_crossings(&signal, 3, 10.0).unwrap();
        assert_eq!(crossings, HalfMagnitudeCrossings::new(2, 3, 5));
    }

    #[test]
    fn test_crossings_negative() {
        let signal = [0.0, -1.0, -6.0, -10.0, -4.0, 0.0];
        let crossings = half_magnitude_crossings(&signal, 3, -10.0).unwrap();
        assert_eq!(crossings, HalfMagnitudeCrossings::new(1, 3, 4));
    }

    #[test]
    fn test_crossings_missing_at_edge() {
        let signal = [10.0, 8.0, 3.0, 0.0];
        assert!(half_magnitude_crossings(&signal, 0, 10.0).is_none());
        let signal = [0.0, 3.0, 8.0, 10.0];
        assert!(half_magnitude_crossings(&signal, 3, 10.0).is_none());
    }

    #[test]
    fn test_symmetric_shape() {
        let time = gridspace(-1.0, 1.0, 0.01);
        let bump = GaussianParams::new(0.0, 2.0, 0.1);
        let signal = bump.predict(&time);
        let peak_index = time.iter().position(|t| t.abs() < 1e-9).unwrap();
        let (shape, crossings) = compute_shape_params(&time, &signal, peak_index, 2.0);
        assert!(crossings.is_some());
        assert!((shape.rise_time + shape.decay_time - shape.fwhm).abs() < 1e-9);
        assert!((shape.symmetry - 0.5).abs() < 1e-9);
        assert!((shape.sharpness_rise - shape.sharpness_decay).abs() < 1e-9);
        assert!(shape.sharpness > 0.0 && shape.sharpness < 1.0);
        // The crossings bracket the analytic FWHM within one sample on each side
        assert!((shape.fwhm - compute_fwhm(0.1)).abs() <= 0.02 + 1e-9);
    }

    #[test]
    fn test_undefined_shape() {
        let time = [0.0, 1.0, 2.0];
        let signal = [5.0, 4.0, 1.0];
        let (shape, crossings) = compute_shape_params(&time, &signal, 0, 5.0);
        assert!(crossings.is_none());
        assert!(shape.is_undefined());
    }
}
