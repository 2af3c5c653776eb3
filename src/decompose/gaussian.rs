use crate::peak::GaussianParams;

/// Gaussian peak shape model
///
/// ```math
/// y = h\exp\left({\frac{-(x - c)^2}{2\sigma^2}}\right)
/// ```
impl GaussianParams {
    /// Compute the theoretical signal at a specified time
    #[inline]
    pub fn density(&self, x: f64) -> f64 {
        self.height * (-0.5 * (x - self.center).powi(2) / self.std.powi(2)).exp()
    }

    /// Given a time sequence, produce the complementary sequence of theoretical values
    pub fn predict(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|t| self.density(*t)).collect()
    }

    /// Compute the partial derivatives of [`GaussianParams::density`] at `x` w.r.t.
    /// the center, height and standard deviation, in that order.
    ///
    /// ```math
    /// \frac{\partial y}{\partial c} = y\frac{x - c}{\sigma^2} \quad
    /// \frac{\partial y}{\partial h} = \exp\left({\frac{-(x - c)^2}{2\sigma^2}}\right) \quad
    /// \frac{\partial y}{\partial \sigma} = y\frac{(x - c)^2}{\sigma^3}
    /// ```
    #[inline]
    pub fn gradient_at(&self, x: f64) -> [f64; 3] {
        let delta = x - self.center;
        let sigma_squared = self.std.powi(2);
        let exp_term = (-0.5 * delta.powi(2) / sigma_squared).exp();
        let y = self.height * exp_term;
        [
            y * delta / sigma_squared,
            exp_term,
            y * delta.powi(2) / (sigma_squared * self.std),
        ]
    }
}

/// Evaluate the sum of all `gaussians` over `times`.
///
/// An empty set of gaussians produces a flat, all-zero signal.
pub fn gaussian_function(times: &[f64], gaussians: &[GaussianParams]) -> Vec<f64> {
    let mut acc = vec![0.0; times.len()];
    for gaussian in gaussians {
        acc.iter_mut()
            .zip(times.iter())
            .for_each(|(y, t)| *y += gaussian.density(*t));
    }
    acc
}

/// Unpack a flat `[center, height, std, center, height, std, ...]` parameter vector
pub fn group_three(params: &[f64]) -> Vec<GaussianParams> {
    params
        .chunks_exact(3)
        .map(|c| GaussianParams::new(c[0], c[1], c[2]))
        .collect()
}

/// Pack gaussians into a flat parameter vector, the inverse of [`group_three`]
pub fn flatten_params(gaussians: &[GaussianParams]) -> Vec<f64> {
    gaussians.iter().flat_map(|g| g.as_array()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_density() {
        let g = GaussianParams::new(1.0, 3.0, 0.5);
        assert!((g.density(1.0) - 3.0).abs() < 1e-12);
        let fwhm_half = crate::peak_statistics::compute_fwhm(0.5) / 2.0;
        assert!((g.density(1.0 + fwhm_half) - 1.5).abs() < 1e-9);
        assert!((g.density(1.0 - fwhm_half) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let g = GaussianParams::new(0.2, -1.5, 0.3);
        let x = 0.35;
        let analytic = g.gradient_at(x);
        let eps = 1e-6;
        let params = g.as_array();
        for k in 0..3 {
            let mut hi = params;
            let mut lo = params;
            hi[k] += eps;
            lo[k] -= eps;
            let numeric = (GaussianParams::from(hi).density(x) - GaussianParams::from(lo).density(x))
                / (2.0 * eps);
            assert!(
                (numeric - analytic[k]).abs() < 1e-5,
                "parameter {k}: numeric {numeric} analytic {}",
                analytic[k]
            );
        }
    }

    #[test]
    fn test_sum_of_gaussians() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(gaussian_function(&times, &[]), vec![0.0; 3]);
        let parts = [GaussianParams::new(0.0, 1.0, 1.0), GaussianParams::new(2.0, 2.0, 1.0)];
        let total = gaussian_function(&times, &parts);
        for (i, t) in times.iter().enumerate() {
            let expected = parts[0].density(*t) + parts[1].density(*t);
            assert!((total[i] - expected).abs() < 1e-12);
        }
        assert_eq!(group_three(&flatten_params(&parts)), parts.to_vec());
    }
}
