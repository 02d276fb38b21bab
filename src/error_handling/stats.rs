//! Probe outcome statistics.
//!
//! Thread-safe counters for record outcomes, shared across probe tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::OutcomeType;

/// Thread-safe outcome statistics tracker.
///
/// Tracks one counter per [`OutcomeType`] using atomics, allowing concurrent
/// updates from multiple tasks. All outcome types are initialized to zero on
/// creation.
pub struct ProbeStats {
    outcomes: HashMap<OutcomeType, AtomicUsize>,
}

impl ProbeStats {
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for outcome in OutcomeType::iter() {
            outcomes.insert(outcome, AtomicUsize::new(0));
        }
        ProbeStats { outcomes }
    }

    /// Increment an outcome counter.
    pub fn increment(&self, outcome: OutcomeType) {
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment outcome counter for {:?} which is not in the map",
                outcome
            );
        }
    }

    /// Get the count for an outcome type.
    pub fn get_count(&self, outcome: OutcomeType) -> usize {
        self.outcomes
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total number of records counted.
    pub fn total(&self) -> usize {
        self.outcomes.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Number of records whose resource was reached.
    pub fn successful(&self) -> usize {
        OutcomeType::iter()
            .filter(OutcomeType::is_success)
            .map(|o| self.get_count(o))
            .sum()
    }

    /// Number of records whose resource was not reached.
    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    /// Sets every counter back to zero.
    pub fn reset(&self) {
        for counter in self.outcomes.values() {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self::new()
    }
}
