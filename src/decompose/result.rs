use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{gaussian_function, FitError};
use crate::peak::{GaussianParams, PeakParams, PeakRecord, ShapeParams};

/// Which family of per-peak parameters to read out of a [`ModelResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamKind {
    /// `[center, height, std]` of the fitted gaussians
    Gaussian,
    /// `[center_time, amplitude, bandwidth]`
    Peak,
    /// `[fwhm, rise_time, decay_time, symmetry, sharpness, sharpness_rise, sharpness_decay]`
    Shape,
}

impl ParamKind {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Gaussian => &["center", "height", "std"],
            Self::Peak => &["center_time", "amplitude", "bandwidth"],
            Self::Shape => &[
                "fwhm",
                "rise_time",
                "decay_time",
                "symmetry",
                "sharpness",
                "sharpness_rise",
                "sharpness_decay",
            ],
        }
    }
}

/// The outcome of decomposing one signal.
///
/// Each accepted peak is a single [`PeakRecord`], so the gaussian, peak and shape views
/// always have the same number of rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelResult {
    pub peaks: Vec<PeakRecord>,
    /// The squared Pearson correlation between the signal and [`ModelResult::peak_fit`]
    pub r_squared: f64,
    /// The configured error metric between the signal and [`ModelResult::peak_fit`]
    pub error: f64,
    /// The sum of all fitted gaussians over the fitted time axis
    pub peak_fit: Vec<f64>,
}

impl Default for ModelResult {
    fn default() -> Self {
        Self::empty()
    }
}

impl ModelResult {
    pub fn new(peaks: Vec<PeakRecord>, r_squared: f64, error: f64, peak_fit: Vec<f64>) -> Self {
        Self {
            peaks,
            r_squared,
            error,
            peak_fit,
        }
    }

    /// A result holding no peaks and undefined scores, as produced by a failed fit
    pub fn empty() -> Self {
        Self {
            peaks: Vec::new(),
            r_squared: f64::NAN,
            error: f64::NAN,
            peak_fit: Vec::new(),
        }
    }

    /// Whether any fitted gaussian holds real values.
    ///
    /// A result with no peaks has no model, whether it came from a failed fit or from a
    /// signal in which nothing was detected.
    pub fn has_model(&self) -> bool {
        self.peaks.iter().any(|p| !p.gaussian.is_nan())
    }

    pub fn n_peaks(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PeakRecord> {
        self.peaks.iter()
    }

    pub fn gaussians(&self) -> Vec<GaussianParams> {
        self.peaks.iter().map(|p| p.gaussian).collect()
    }

    /// The fitted gaussians as `[center, height, std]` rows
    pub fn gaussian_params(&self) -> Vec<[f64; 3]> {
        self.peaks.iter().map(|p| p.gaussian.as_array()).collect()
    }

    /// The reported peaks as `[center_time, amplitude, bandwidth]` rows
    pub fn peak_params(&self) -> Vec<[f64; 3]> {
        self.peaks.iter().map(|p| p.peak.as_array()).collect()
    }

    pub fn shape_params(&self) -> Vec<[f64; 7]> {
        self.peaks.iter().map(|p| p.shape.as_array()).collect()
    }

    /// Read the rows of one parameter family, or a single column of it.
    ///
    /// # Errors
    /// [`FitError::InvalidSettings`] if `column` is out of range for `kind`
    pub fn get_params(
        &self,
        kind: ParamKind,
        column: Option<usize>,
    ) -> Result<Vec<Vec<f64>>, FitError> {
        let rows: Vec<Vec<f64>> = match kind {
            ParamKind::Gaussian => self.gaussian_params().iter().map(|r| r.to_vec()).collect(),
            ParamKind::Peak => self.peak_params().iter().map(|r| r.to_vec()).collect(),
            ParamKind::Shape => self.shape_params().iter().map(|r| r.to_vec()).collect(),
        };
        match column {
            None => Ok(rows),
            Some(i) if i < kind.columns().len() => {
                Ok(rows.into_iter().map(|r| vec![r[i]]).collect())
            }
            Some(i) => Err(FitError::InvalidSettings(format!(
                "column {i} is out of range for {kind:?} parameters with {} columns",
                kind.columns().len()
            ))),
        }
    }

    pub fn peak_records(&self) -> &[PeakRecord] {
        &self.peaks
    }

    pub fn peak(&self, index: usize) -> Option<(&GaussianParams, &PeakParams, &ShapeParams)> {
        self.peaks
            .get(index)
            .map(|p| (&p.gaussian, &p.peak, &p.shape))
    }

    /// Re-evaluate the stored gaussians over `time`
    pub fn regenerate(&self, time: &[f64]) -> Vec<f64> {
        gaussian_function(time, &self.gaussians())
    }
}

impl fmt::Display for ModelResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ModelResult(n_peaks={}, r_squared={:.4}, error={:.4})",
            self.n_peaks(),
            self.r_squared,
            self.error
        )?;
        for peak in self.peaks.iter() {
            writeln!(f, "  {peak}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ModelResult {
    type Item = &'a PeakRecord;
    type IntoIter = std::slice::Iter<'a, PeakRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peak::HalfMagnitudeCrossings;

    fn record(center: f64) -> PeakRecord {
        PeakRecord::new(
            GaussianParams::new(center, 1.0, 0.1),
            PeakParams::new(center, 0.9, 0.2),
            ShapeParams {
                fwhm: 0.2,
                rise_time: 0.1,
                decay_time: 0.1,
                symmetry: 0.5,
                sharpness: 0.9,
                sharpness_rise: 0.45,
                sharpness_decay: 0.45,
            },
            Some(HalfMagnitudeCrossings::new(1, 2, 3)),
        )
    }

    #[test]
    fn test_empty() {
        let result = ModelResult::empty();
        assert!(!result.has_model());
        assert_eq!(result.n_peaks(), 0);
        assert!(result.r_squared.is_nan());
        assert!(result.error.is_nan());
    }

    #[test]
    fn test_get_params() {
        let result = ModelResult::new(vec![record(0.2), record(0.6)], 0.9, 0.01, Vec::new());
        assert!(result.has_model());
        let centers = result.get_params(ParamKind::Gaussian, Some(0)).unwrap();
        assert_eq!(centers, vec![vec![0.2], vec![0.6]]);
        let shapes = result.get_params(ParamKind::Shape, None).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].len(), 7);
        assert!(result.get_params(ParamKind::Peak, Some(3)).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde() {
        let result = ModelResult::new(vec![record(0.4)], 0.95, 0.02, vec![0.0, 0.5, 0.0]);
        let text = serde_json::to_string(&result).unwrap();
        let dup: ModelResult = serde_json::from_str(&text).unwrap();
        assert_eq!(dup.n_peaks(), 1);
        assert_eq!(dup.peaks[0].crossings, result.peaks[0].crossings);
        assert!((dup.peaks[0].gaussian.center - 0.4).abs() < 1e-12);
        assert!((dup.r_squared - 0.95).abs() < 1e-12);
    }
}
