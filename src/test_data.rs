//! Synthetic signals for tests, built from sums of gaussians on a fixed time axis.
use crate::arrayops::gridspace;
use crate::decompose::gaussian_function;
use crate::peak::GaussianParams;

/// 1000 samples over `[0, 1)` spaced 1 ms apart
pub fn time_axis() -> Vec<f64> {
    gridspace(0.0, 1.0, 0.001)
}

/// Evaluate `gaussians` over [`time_axis`], returning `(time, signal)`
pub fn bump_signal(gaussians: &[GaussianParams]) -> (Vec<f64>, Vec<f64>) {
    let time = time_axis();
    let signal = gaussian_function(&time, gaussians);
    (time, signal)
}

/// A deterministic low amplitude ripple to perturb clean signals with
pub fn ripple(time: &[f64], amplitude: f64) -> Vec<f64> {
    time.iter()
        .map(|t| amplitude * ((t * 173.0).sin() + 0.5 * (t * 411.0).cos()))
        .collect()
}
