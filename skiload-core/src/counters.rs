use std::sync::atomic::{AtomicU64, Ordering};

/// Success and failure totals shared by every worker of every phase of a run.
#[derive(Debug, Default)]
pub struct RunCounters {
    success: AtomicU64,
    failure: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.success() + self.failure()
    }
}
