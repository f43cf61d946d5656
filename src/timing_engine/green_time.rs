use crate::config::TimingConfig;

/// Green time for a single lane, interpolated linearly between `min_green` (no traffic)
/// and `max_green` (`max_count` vehicles or more).
///
/// Both ends are clamped, so negative or oversized counts still land inside the bounds.
pub fn green_time_for(count: f64, timing: &TimingConfig) -> f64 {
    let span = timing.max_green - timing.min_green;
    let raw = timing.min_green + (count / timing.max_count) * span;
    raw.clamp(timing.min_green, timing.max_green)
}

/// Maps one count per lane to one green time per lane. Pure: the same counts always
/// produce the same timings.
pub fn compute_green_times(counts: &[f64], timing: &TimingConfig) -> Vec<f64> {
    counts
        .iter()
        .map(|&count| green_time_for(count, timing))
        .collect()
}
