//! Joint bounded least squares refinement of a set of gaussian guesses.
//!
//! The solver is a Levenberg-Marquardt iteration over the flattened
//! `[center, height, std, ...]` parameter vector using the analytic Jacobian of
//! [`GaussianParams::gradient_at`]. Steps are projected back into the parameter box,
//! so every evaluated model lies within the bounds.
use cfg_if::cfg_if;
use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{flatten_params, gaussian_function, group_three, FitConfig, FitError, SignalArgs};
use crate::peak::GaussianParams;

/// Lower and upper bounds over a flattened parameter vector
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParamBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ParamBounds {
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Project `params` into the box
    pub fn clamp(&self, params: &mut [f64]) {
        for ((p, lo), hi) in params
            .iter_mut()
            .zip(self.lower.iter())
            .zip(self.upper.iter())
        {
            *p = p.max(*lo).min(*hi);
        }
    }

    pub fn contains(&self, params: &[f64]) -> bool {
        params
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(p, (lo, hi))| *lo <= *p && *p <= *hi)
    }
}

/// Build the bounds for jointly fitting `guesses`.
///
/// Each center may move `2 * center_bound * std` either way, clamped to `time_range`.
/// Heights are unbounded in both directions since a peak may dip below baseline, and
/// standard deviations are held within `std_limits`.
pub fn build_bounds(
    guesses: &[GaussianParams],
    std_limits: (f64, f64),
    center_bound: f64,
    time_range: (f64, f64),
) -> ParamBounds {
    let mut lower = Vec::with_capacity(guesses.len() * 3);
    let mut upper = Vec::with_capacity(guesses.len() * 3);
    for guess in guesses {
        let shift = 2.0 * center_bound * guess.std;

        let center_lo = guess.center - shift;
        let center_lo = if center_lo > time_range.0 {
            center_lo
        } else {
            time_range.0
        };
        let center_hi = guess.center + shift;
        let center_hi = if center_hi < time_range.1 {
            center_hi
        } else {
            time_range.1
        };

        lower.extend([center_lo, f64::NEG_INFINITY, std_limits.0]);
        upper.extend([center_hi, f64::INFINITY, std_limits.1]);
    }
    ParamBounds { lower, upper }
}

/// A summary of a successful solver run
#[derive(Debug, Clone, PartialEq)]
pub struct SolverReport {
    /// The fitted parameters, flattened
    pub params: Vec<f64>,
    /// Half the sum of squared residuals at `params`
    pub cost: f64,
    /// The number of model evaluations spent
    pub evaluations: usize,
    pub iterations: usize,
}

/// Tolerances and budget for [`LevenbergMarquardt`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    /// The maximum number of model evaluations before giving up
    pub max_evaluations: usize,
    /// Relative cost reduction below which the fit is converged
    pub ftol: f64,
    /// Relative step size below which the fit is converged
    pub xtol: f64,
    /// Projected gradient magnitude below which the fit is converged
    pub gtol: f64,
    /// The initial damping factor
    pub initial_damping: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_evaluations: 500,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_damping: 1e-3,
        }
    }
}

fn singular_error() -> FitError {
    FitError::FitFailed(
        "the normal equations became singular during peak fitting. \
         This can happen with settings that are too liberal, leading \
         to a large number of guess peaks that cannot be fit together"
            .to_string(),
    )
}

cfg_if! {
    if #[cfg(feature = "nalgebra")] {
        /// Solve the dense `m × m` system `a x = b`, with `a` given in row-major order
        fn solve_linear(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
            use nalgebra::{DMatrix, DVector};
            let m = b.len();
            let a = DMatrix::from_row_slice(m, m, a);
            let b = DVector::from_column_slice(b);
            a.lu().solve(&b).map(|x| x.iter().copied().collect())
        }
    } else if #[cfg(feature = "ndarray")] {
        /// Solve the dense `m × m` system `a x = b`, with `a` given in row-major order
        fn solve_linear(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
            use ndarray::{Array1, Array2};
            use ndarray_linalg::Solve;
            let m = b.len();
            let a = Array2::from_shape_vec((m, m), a.to_vec()).ok()?;
            let b = Array1::from(b.to_vec());
            a.solve_into(b).ok().map(|x| x.to_vec())
        }
    } else {
        compile_error!("One of the `nalgebra` or `ndarray` features must be enabled to solve the peak model");
    }
}

fn squared_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

impl LevenbergMarquardt {
    pub fn new(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            ..Default::default()
        }
    }

    /// `y - f(params)` for the sum-of-gaussians model
    fn residuals(time: &[f64], signal: &[f64], params: &[f64]) -> Vec<f64> {
        let model = gaussian_function(time, &group_three(params));
        signal.iter().zip(model).map(|(y, yhat)| y - yhat).collect()
    }

    /// Accumulate `JᵀJ` and `Jᵀr` for the model Jacobian `J` at `params`
    fn normal_equations(
        time: &[f64],
        residuals: &[f64],
        params: &[f64],
    ) -> (Vec<f64>, Vec<f64>) {
        let m = params.len();
        let gaussians = group_three(params);
        let mut jtj = vec![0.0; m * m];
        let mut jtr = vec![0.0; m];
        let mut row = vec![0.0; m];

        for (t, r) in time.iter().zip(residuals.iter()) {
            for (k, g) in gaussians.iter().enumerate() {
                row[k * 3..k * 3 + 3].copy_from_slice(&g.gradient_at(*t));
            }
            for a in 0..m {
                let ja = row[a];
                if ja == 0.0 {
                    continue;
                }
                jtr[a] += ja * r;
                for b in a..m {
                    jtj[a * m + b] += ja * row[b];
                }
            }
        }
        for a in 0..m {
            for b in 0..a {
                jtj[a * m + b] = jtj[b * m + a];
            }
        }
        (jtj, jtr)
    }

    /// The infinity norm of the gradient, ignoring components which would push a
    /// parameter already at a bound further out of the box
    fn projected_gradient_norm(gradient: &[f64], params: &[f64], bounds: &ParamBounds) -> f64 {
        gradient
            .iter()
            .zip(params.iter())
            .zip(bounds.lower.iter().zip(bounds.upper.iter()))
            .map(|((g, p), (lo, hi))| {
                if (*p <= *lo && *g < 0.0) || (*p >= *hi && *g > 0.0) {
                    0.0
                } else {
                    g.abs()
                }
            })
            .fold(0.0, f64::max)
    }

    /// Minimize the squared error between `signal` and a sum of gaussians over `time`,
    /// starting from `initial` and staying within `bounds`.
    ///
    /// # Errors
    /// [`FitError::FitFailed`] if the evaluation budget runs out before convergence, the
    /// normal equations are singular, or the cost becomes non-finite.
    pub fn solve(
        &self,
        time: &[f64],
        signal: &[f64],
        initial: &[f64],
        bounds: &ParamBounds,
    ) -> Result<SolverReport, FitError> {
        let m = initial.len();
        let mut params = initial.to_vec();
        bounds.clamp(&mut params);

        let mut residuals = Self::residuals(time, signal, &params);
        let mut cost = 0.5 * squared_norm(&residuals);
        let mut evaluations = 1;
        if !cost.is_finite() {
            return Err(FitError::FitFailed(
                "the initial model produced a non-finite error".to_string(),
            ));
        }

        let mut damping = self.initial_damping;
        let mut iterations = 0;

        loop {
            if cost == 0.0 {
                break;
            }

            let (jtj, jtr) = Self::normal_equations(time, &residuals, &params);
            let gradient_norm = Self::projected_gradient_norm(&jtr, &params, bounds);
            if gradient_norm < self.gtol {
                trace!("{iterations}: Converged on gradient {gradient_norm:e}");
                break;
            }

            let max_diagonal = (0..m).map(|k| jtj[k * m + k]).fold(0.0, f64::max);
            let diagonal_floor = (max_diagonal * 1e-12).max(f64::MIN_POSITIVE);

            let mut accepted = false;
            let mut converged = false;
            while !accepted {
                if evaluations >= self.max_evaluations {
                    return Err(FitError::FitFailed(format!(
                        "the solver did not converge within {} model evaluations",
                        self.max_evaluations
                    )));
                }

                let mut damped = jtj.clone();
                for k in 0..m {
                    damped[k * m + k] += damping * jtj[k * m + k].max(diagonal_floor);
                }
                let step = solve_linear(&damped, &jtr).ok_or_else(singular_error)?;
                if step.iter().any(|s| !s.is_finite()) {
                    return Err(singular_error());
                }

                let mut candidate: Vec<f64> =
                    params.iter().zip(step.iter()).map(|(p, s)| p + s).collect();
                bounds.clamp(&mut candidate);

                let moved: Vec<f64> = candidate
                    .iter()
                    .zip(params.iter())
                    .map(|(a, b)| a - b)
                    .collect();
                let step_norm = squared_norm(&moved).sqrt();
                if step_norm <= self.xtol * (self.xtol + squared_norm(&params).sqrt()) {
                    trace!("{iterations}: Converged on step size {step_norm:e}");
                    converged = true;
                    break;
                }

                let candidate_residuals = Self::residuals(time, signal, &candidate);
                let candidate_cost = 0.5 * squared_norm(&candidate_residuals);
                evaluations += 1;

                if candidate_cost.is_finite() && candidate_cost < cost {
                    let reduction = cost - candidate_cost;
                    trace!(
                        "{iterations}: Cost {cost:0.6e} -> {candidate_cost:0.6e}, damping = {damping:e}"
                    );
                    params = candidate;
                    residuals = candidate_residuals;
                    let previous = cost;
                    cost = candidate_cost;
                    damping = (damping / 10.0).max(1e-15);
                    accepted = true;
                    if reduction <= self.ftol * previous {
                        trace!("{iterations}: Converged on cost reduction {reduction:e}");
                        converged = true;
                    }
                } else {
                    damping *= 10.0;
                }
            }
            iterations += 1;
            if converged {
                break;
            }
        }

        Ok(SolverReport {
            params,
            cost,
            evaluations,
            iterations,
        })
    }
}

/// Jointly fit all `guesses` against the signal in `data`, returning the fitted gaussians
/// sorted by center.
///
/// An empty set of guesses skips the solver entirely.
pub fn fit_peak_guess(
    data: &SignalArgs,
    guesses: &[GaussianParams],
    config: &FitConfig,
) -> Result<Vec<GaussianParams>, FitError> {
    if guesses.is_empty() {
        return Ok(Vec::new());
    }

    let bounds = build_bounds(
        guesses,
        config.gauss_std_limits(),
        config.center_bound,
        data.time_range,
    );
    let initial = flatten_params(guesses);

    let solver = LevenbergMarquardt::new(config.max_evaluations);
    let report = solver.solve(&data.time, &data.signal, &initial, &bounds)?;
    trace!(
        "Joint fit of {} peaks finished after {} evaluations with cost {:0.6e}",
        guesses.len(),
        report.evaluations,
        report.cost
    );

    let mut gaussians = group_three(&report.params);
    gaussians.sort_by(|a, b| a.center.total_cmp(&b.center));
    Ok(gaussians)
}
