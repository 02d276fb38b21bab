//! Progress logging utilities.

use log::info;

use crate::error_handling::ProbeStats;

/// Logs how many records have been produced so far and the current rate.
///
/// # Arguments
///
/// * `start_time` - The start time of the run
/// * `stats` - Outcome counters of the run
/// * `total` - Number of input locators
pub fn log_progress(start_time: std::time::Instant, stats: &ProbeStats, total: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let completed = stats.total();
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Probed {}/{} locators ({} reachable) in {:.2} seconds (~{:.2} locators/sec)",
        completed,
        total,
        stats.successful(),
        elapsed_secs,
        rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::OutcomeType;

    #[test]
    fn test_log_progress_does_not_panic() {
        let stats = ProbeStats::new();
        log_progress(std::time::Instant::now(), &stats, 0);
        stats.increment(OutcomeType::Reachable);
        log_progress(std::time::Instant::now(), &stats, 10);
    }
}
