use criterion::Criterion;

use erpsignal::arrayops::gridspace;
use erpsignal::decompose::{
    find_candidates, fit_peak_guess, gaussian_function, FitConfig, PeakModelFitter, RunMode,
    SignalArgs,
};
use erpsignal::peak::GaussianParams;

fn make_signal() -> (Vec<f64>, Vec<f64>) {
    let time = gridspace(0.0, 1.0, 0.001);
    let signal = gaussian_function(
        &time,
        &[
            GaussianParams::new(0.15, 1.0, 0.02),
            GaussianParams::new(0.35, -2.0, 0.04),
            GaussianParams::new(0.6, 1.5, 0.03),
            GaussianParams::new(0.8, -0.7, 0.05),
        ],
    );
    (time, signal)
}

fn config() -> FitConfig {
    FitConfig::default()
        .peak_width_limits(0.01, 0.5)
        .min_peak_height(0.1)
}

fn detection(c: &mut Criterion) {
    let (time, signal) = make_signal();
    let args = SignalArgs::prepare(&time, &signal, None, false, &RunMode::default()).unwrap();
    let config = config();
    c.bench_function("find_candidates", |b| {
        b.iter(|| find_candidates(&args, &config))
    });
}

fn joint_fit(c: &mut Criterion) {
    let (time, signal) = make_signal();
    let args = SignalArgs::prepare(&time, &signal, None, false, &RunMode::default()).unwrap();
    let config = config();
    let (guesses, _) = find_candidates(&args, &config);
    c.bench_function("fit_peak_guess", |b| {
        b.iter(|| fit_peak_guess(&args, &guesses, &config))
    });
}

fn full_pipeline(c: &mut Criterion) {
    let (time, signal) = make_signal();
    let fitter = PeakModelFitter::new(config());
    c.bench_function("peak_model_fit", |b| {
        b.iter(|| fitter.fit(&time, &signal, None))
    });
}

fn fitting(c: &mut Criterion) {
    detection(c);
    joint_fit(c);
    full_pipeline(c);
}

criterion::criterion_group!(benches, fitting);
criterion::criterion_main!(benches);
