use num_traits::{Float, ToPrimitive};

/// Build an evenly spaced coordinate grid over `[start, end)` with `step` spacing.
pub fn gridspace<T: Float + ToPrimitive>(start: T, end: T, step: T) -> Vec<T> {
    let distance = end - start;
    let steps = (distance / step).round().to_usize().unwrap_or_default();
    let mut result = Vec::with_capacity(steps);
    for i in 0..steps {
        result.push(start + T::from(i).unwrap() * step);
    }
    result
}

/// The arithmetic mean of `values`, `NaN` when empty
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// The population standard deviation (zero degrees of freedom) of `values`
pub fn std_dev(values: &[f64]) -> f64 {
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Pearson's correlation coefficient between `x` and `y`.
///
/// Returns `NaN` when either series has zero variance, leaving it to the caller
/// to decide what an undefined correlation means.
pub fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return f64::NAN;
    }
    let mx = mean(&x[..n]);
    let my = mean(&y[..n]);
    let (sxy, sxx, syy) = x
        .iter()
        .zip(y.iter())
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (a, b)| {
            let da = a - mx;
            let db = b - my;
            (sxy + da * db, sxx + da * da, syy + db * db)
        });
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}

/// Find the index of the value with the greatest magnitude, keeping its sign.
///
/// Both the most positive and the most negative points are considered and the
/// larger magnitude wins. Equal magnitudes favor the positive point.
pub fn argmax_abs(values: &[f64]) -> Option<(usize, f64)> {
    let mut hi: Option<(usize, f64)> = None;
    let mut lo: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        match hi {
            Some((_, best)) if v <= best => {}
            _ => hi = Some((i, v)),
        }
        match lo {
            Some((_, best)) if v >= best => {}
            _ => lo = Some((i, v)),
        }
    }
    match (hi, lo) {
        (Some(hi), Some(lo)) => {
            if lo.1.abs() > hi.1.abs() {
                Some(lo)
            } else {
                Some(hi)
            }
        }
        _ => None,
    }
}
