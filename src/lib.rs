//! `erpsignal` is a library for parameterizing event-related responses and similar
//! evenly sampled one dimensional signals as a sum of gaussian peaks.
//!
//! A signal is decomposed by greedily detecting candidate peaks, rejecting those too close
//! to the edges or overlapping a larger neighbor, and refining the rest jointly with a
//! bounded nonlinear least squares fit. Each fitted peak is then described by its location
//! and amplitude as seen in the signal, and by the shape of its waveform between its
//! half-magnitude crossings: duration, rise and decay times, symmetry and sharpness.
//!
//! The fitting engine lives in [`decompose`] and can be used directly through
//! [`PeakModelFitter`]. [`PeakModel`] holds a signal and its fit together, and
//! [`PeakModelGroup`] fits many signals sharing one time axis.
//!
//! # Usage
//! ```
//! use erpsignal::arrayops::gridspace;
//! use erpsignal::decompose::gaussian_function;
//! use erpsignal::peak::GaussianParams;
//! use erpsignal::{FitConfig, PeakModelFitter};
//!
//! let time = gridspace(0.0, 1.0, 0.001);
//! let signal = gaussian_function(
//!     &time,
//!     &[
//!         GaussianParams::new(0.2, 1.0, 0.02),
//!         GaussianParams::new(0.45, -1.5, 0.04),
//!         GaussianParams::new(0.75, 0.7, 0.05),
//!     ],
//! );
//!
//! let fitter = PeakModelFitter::new(
//!     FitConfig::default()
//!         .peak_width_limits(0.01, 0.5)
//!         .min_peak_height(0.1),
//! );
//! let result = fitter.fit(&time, &signal, None).unwrap();
//! assert_eq!(result.n_peaks(), 3);
//! for peak in result.iter() {
//!     println!("{}", peak);
//! }
//! ```
//! ## Building
//! The least squares solver needs a dense linear solver. By default this is provided by
//! `nalgebra`. Alternatively `ndarray-linalg` may be used, which needs a LAPACK
//! implementation enabled by passing one of the supported backends as a `feature` to
//! `cargo`, e.g. `openblas`, `netlib` or `intel-mkl`.
pub mod arrayops;
pub mod decompose;
pub mod group;
pub mod model;
pub mod peak;
pub mod peak_statistics;

#[cfg(test)]
mod test_data;

pub use crate::decompose::{ErrorMetric, FitConfig, FitError, ModelResult, PeakModelFitter, RunMode};
pub use crate::group::PeakModelGroup;
pub use crate::model::PeakModel;
pub use crate::peak::{GaussianParams, PeakParams, PeakRecord, ShapeParams};
