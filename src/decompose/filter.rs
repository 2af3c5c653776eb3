//! Rejection rules applied to candidate peaks before they are fit jointly.
use log::debug;

use crate::peak::GaussianParams;

/// Drop candidates whose center lies within `edge_threshold` standard deviations of either
/// end of `time_range`.
pub fn drop_peak_edge(
    guesses: Vec<GaussianParams>,
    time_range: (f64, f64),
    edge_threshold: f64,
) -> Vec<GaussianParams> {
    let (lo, hi) = time_range;
    guesses
        .into_iter()
        .filter(|guess| {
            let limit = guess.std * edge_threshold;
            let keep = (guess.center - lo).abs() > limit && (guess.center - hi).abs() > limit;
            if !keep {
                debug!("Dropping {guess}, too close to the edge of the time range");
            }
            keep
        })
        .collect()
}

/// Drop candidates which overlap their neighbor by more than `overlap_threshold` standard
/// deviations.
///
/// Candidates are sorted by center first. For each adjacent pair whose intervals
/// `center ± std * overlap_threshold` intersect, the one with the lower height is dropped,
/// comparing signed heights, with the left candidate dropped on a tie. Every pair is
/// judged against the sorted list before anything is removed, and the pruned list is not
/// checked again.
pub fn drop_peak_overlap(
    mut guesses: Vec<GaussianParams>,
    overlap_threshold: f64,
) -> Vec<GaussianParams> {
    guesses.sort_by(|a, b| a.center.total_cmp(&b.center));

    let bounds: Vec<(f64, f64)> = guesses
        .iter()
        .map(|g| g.span(overlap_threshold))
        .collect();

    let mut drop = vec![false; guesses.len()];
    for (i, pair) in bounds.windows(2).enumerate() {
        let (left, right) = (pair[0], pair[1]);
        if left.1 > right.0 {
            let lowest = if guesses[i].height <= guesses[i + 1].height {
                i
            } else {
                i + 1
            };
            debug!(
                "Dropping {} which overlaps with its neighbor",
                guesses[lowest]
            );
            drop[lowest] = true;
        }
    }

    guesses
        .into_iter()
        .zip(drop)
        .filter_map(|(g, dropped)| (!dropped).then_some(g))
        .collect()
}
