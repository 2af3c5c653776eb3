//! Decompose a signal-over-time into a sum of gaussian peaks.
//!
//! The fitting procedure runs in stages:
//! 1. Greedily find candidate peaks, repeatedly taking the largest magnitude point of a
//!    working copy of the signal and subtracting a gaussian guess for it, until the
//!    remaining points are below the detection thresholds.
//! 2. Drop candidates too close to the edge of the time range, then drop the lower of any
//!    two neighboring candidates that overlap.
//! 3. Jointly refine the surviving candidates against the signal with a bounded
//!    Levenberg-Marquardt least squares solver.
//! 4. Measure each fitted peak on the signal itself, locating its half-magnitude crossings
//!    to describe its shape, and discard peaks whose crossings cannot be found.
//! 5. Score the reconstruction against the signal with `R²` and an [`ErrorMetric`].
//!
//! # Example
//!
//! ```rust
//! use erpsignal::arrayops::gridspace;
//! use erpsignal::decompose::{gaussian_function, FitConfig, PeakModelFitter};
//! use erpsignal::peak::GaussianParams;
//!
//! let time = gridspace(0.0, 1.0, 0.001);
//! let signal = gaussian_function(
//!     &time,
//!     &[
//!         GaussianParams::new(0.3, 1.0, 0.03),
//!         GaussianParams::new(0.7, -0.8, 0.04),
//!     ],
//! );
//! let fitter = PeakModelFitter::new(
//!     FitConfig::default()
//!         .peak_width_limits(0.01, 0.5)
//!         .min_peak_height(0.1),
//! );
//! let result = fitter.fit(&time, &signal, None).unwrap();
//! assert_eq!(result.n_peaks(), 2);
//! assert!(result.r_squared > 0.99);
//! ```
//!
//! # Failure Handling
//!
//! Malformed inputs and invalid settings are always reported as a [`FitError`]. When the
//! solver itself fails, the fit yields [`ModelResult::empty`] instead, unless
//! [`RunMode::debug`] is set, so that fitting many signals is not interrupted by one.

mod config;
mod data;
mod detect;
mod error;
mod filter;
mod fitter;
mod gaussian;
mod result;
mod solver;

pub use config::{ErrorMetric, FitConfig, RunMode};
pub use data::{SignalArgs, SignalArgsIter};
pub use detect::{find_candidates, guess_peak, shortest_half_width, StopReason};
pub use error::FitError;
pub use filter::{drop_peak_edge, drop_peak_overlap};
pub use fitter::PeakModelFitter;
pub use gaussian::{flatten_params, gaussian_function, group_three};
pub use result::{ModelResult, ParamKind};
pub use solver::{build_bounds, fit_peak_guess, LevenbergMarquardt, ParamBounds, SolverReport};
