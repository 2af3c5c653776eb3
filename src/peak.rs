use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The parameters of a single gaussian component, either as an initial guess
/// or as produced by the joint fit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianParams {
    /// The location of the gaussian's center along the time axis
    pub center: f64,
    /// The signed height of the gaussian
    pub height: f64,
    /// The one-sided standard deviation
    pub std: f64,
}

impl GaussianParams {
    pub fn new(center: f64, height: f64, std: f64) -> Self {
        Self {
            center,
            height,
            std,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.center, self.height, self.std]
    }

    /// The interval `center ± std * scale`
    pub fn span(&self, scale: f64) -> (f64, f64) {
        let half = self.std * scale;
        (self.center - half, self.center + half)
    }

    pub fn is_nan(&self) -> bool {
        self.center.is_nan() && self.height.is_nan() && self.std.is_nan()
    }
}

impl From<[f64; 3]> for GaussianParams {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for GaussianParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GaussianParams({}, {}, {})",
            self.center, self.height, self.std
        )
    }
}

/// The reported view of a fitted gaussian.
///
/// The amplitude is read off of the signal near the gaussian rather than from the
/// fitted height, which is hard to interpret when components overlap.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakParams {
    /// The time of the extreme signal sample near the gaussian
    pub center_time: f64,
    /// The signal value at `center_time`
    pub amplitude: f64,
    /// The two-sided bandwidth, `2 * std`
    pub bandwidth: f64,
}

impl PeakParams {
    pub fn new(center_time: f64, amplitude: f64, bandwidth: f64) -> Self {
        Self {
            center_time,
            amplitude,
            bandwidth,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.center_time, self.amplitude, self.bandwidth]
    }
}

impl fmt::Display for PeakParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PeakParams({}, {}, {})",
            self.center_time, self.amplitude, self.bandwidth
        )
    }
}

/// Descriptors of a peak's waveform measured between its half-magnitude crossings
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeParams {
    pub fwhm: f64,
    pub rise_time: f64,
    pub decay_time: f64,
    /// `rise_time / fwhm`
    pub symmetry: f64,
    pub sharpness: f64,
    pub sharpness_rise: f64,
    pub sharpness_decay: f64,
}

impl ShapeParams {
    /// A shape whose crossings could not be located
    pub fn undefined() -> Self {
        Self {
            fwhm: f64::NAN,
            rise_time: f64::NAN,
            decay_time: f64::NAN,
            symmetry: f64::NAN,
            sharpness: f64::NAN,
            sharpness_rise: f64::NAN,
            sharpness_decay: f64::NAN,
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.as_array().iter().all(|v| v.is_nan())
    }

    pub fn as_array(&self) -> [f64; 7] {
        [
            self.fwhm,
            self.rise_time,
            self.decay_time,
            self.symmetry,
            self.sharpness,
            self.sharpness_rise,
            self.sharpness_decay,
        ]
    }
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Sample indices of the half-magnitude crossings bracketing a peak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HalfMagnitudeCrossings {
    pub start: usize,
    pub peak: usize,
    pub end: usize,
}

impl HalfMagnitudeCrossings {
    pub fn new(start: usize, peak: usize, end: usize) -> Self {
        Self { start, peak, end }
    }
}

/// Every facet of one decomposed peak, kept together so that they can only be
/// retained or dropped as a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakRecord {
    pub gaussian: GaussianParams,
    pub peak: PeakParams,
    pub shape: ShapeParams,
    /// `None` when the peak's shape could not be resolved
    pub crossings: Option<HalfMagnitudeCrossings>,
}

impl PeakRecord {
    pub fn new(
        gaussian: GaussianParams,
        peak: PeakParams,
        shape: ShapeParams,
        crossings: Option<HalfMagnitudeCrossings>,
    ) -> Self {
        Self {
            gaussian,
            peak,
            shape,
            crossings,
        }
    }

    /// Whether both half-magnitude crossings were located
    pub fn has_shape(&self) -> bool {
        self.crossings.is_some()
    }
}

impl fmt::Display for PeakRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PeakRecord(time={:.4}, amplitude={:.4}, bandwidth={:.4}, fwhm={:.4}, symmetry={:.3}, sharpness={:.3})",
            self.peak.center_time,
            self.peak.amplitude,
            self.peak.bandwidth,
            self.shape.fwhm,
            self.shape.symmetry,
            self.shape.sharpness,
        )
    }
}
