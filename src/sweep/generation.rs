use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic sweep counter.
///
/// Each sweep takes a new generation when it starts. A finished sweep whose generation is no
/// longer the latest was superseded and its results should be discarded. In-flight work is
/// never cancelled.
#[derive(Debug, Default)]
pub struct SweepGenerations {
    latest: AtomicU64,
}

impl SweepGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sweep and return its generation (first is `1`).
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation != 0 && generation == self.latest()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sweep/generation.rs"]
mod tests;
