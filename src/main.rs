use std::io;
use std::time::Instant;

use erpsignal::arrayops::gridspace;
use erpsignal::decompose::gaussian_function;
use erpsignal::{FitConfig, GaussianParams, PeakModelFitter, PeakModelGroup};

fn main() -> io::Result<()> {
    let time = gridspace(-0.1, 0.6, 0.001);
    let components = [
        GaussianParams::new(0.1, 2.5, 0.012),
        GaussianParams::new(0.17, -3.0, 0.02),
        GaussianParams::new(0.32, 4.0, 0.05),
    ];
    let signal: Vec<f64> = gaussian_function(&time, &components)
        .into_iter()
        .zip(time.iter())
        .map(|(y, t)| y + 0.05 * (t * 211.0).sin())
        .collect();

    let fitter = PeakModelFitter::new(
        FitConfig::default()
            .peak_width_limits(0.01, 0.3)
            .min_peak_height(0.5),
    );

    let start = Instant::now();
    match fitter.fit(&time, &signal, None) {
        Ok(result) => {
            println!(
                "Fitting took microseconds {}",
                (Instant::now() - start).as_micros()
            );
            print!("{result}");
        }
        Err(err) => println!("Encountered error {:?}", err),
    };

    let signals: Vec<Vec<f64>> = (1..=8)
        .map(|i| {
            let scale = i as f64 / 4.0;
            let scaled: Vec<GaussianParams> = components
                .iter()
                .map(|c| GaussianParams::new(c.center, c.height * scale, c.std))
                .collect();
            gaussian_function(&time, &scaled)
        })
        .collect();

    let mut group = PeakModelGroup::new(fitter.config.clone());
    let start = Instant::now();
    match group.fit(&time, &signals, None) {
        Ok(_) => {
            println!(
                "Fitting {} signals took milliseconds {}",
                group.len(),
                (Instant::now() - start).as_millis()
            );
            println!("Peaks per signal: {:?}", group.n_peaks());
            println!("Failed fits: {:?}", group.failed_fit_indices());
        }
        Err(err) => println!("Encountered error {:?}", err),
    };
    Ok(())
}
