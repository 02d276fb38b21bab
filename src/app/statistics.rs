//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{OutcomeType, ProbeStats};

/// Prints the per-outcome counters and a one-line summary of the run.
pub fn print_outcome_statistics(stats: &ProbeStats, elapsed_seconds: f64) {
    let total = stats.total();

    if total > 0 {
        info!("Outcome Counts ({} total):", total);
        for outcome in OutcomeType::iter() {
            let count = stats.get_count(outcome);
            if count > 0 {
                info!("   {}: {}", outcome.as_str(), count);
            }
        }
    }

    info!(
        "✅ Probed {} locator{} ({} reachable, {} unreachable) in {:.1}s",
        total,
        if total == 1 { "" } else { "s" },
        stats.successful(),
        stats.failed(),
        elapsed_seconds
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_outcome_statistics_empty() {
        let stats = ProbeStats::new();
        // Should not panic when nothing was probed
        print_outcome_statistics(&stats, 0.0);
    }

    #[test]
    fn test_print_outcome_statistics_mixed() {
        let stats = ProbeStats::new();
        stats.increment(OutcomeType::Reachable);
        stats.increment(OutcomeType::FtpNotFound);
        stats.increment(OutcomeType::RetriesExhausted);
        print_outcome_statistics(&stats, 1.5);
        assert_eq!(stats.successful(), 1);
        assert_eq!(stats.failed(), 2);
    }
}
