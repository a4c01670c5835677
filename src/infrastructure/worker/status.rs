use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Live state of a [`super::JobWorker`], shared with the health endpoints
#[derive(Debug, Default)]
pub struct WorkerStatus {
    ready: AtomicBool,
    in_flight: AtomicUsize,
    handled: AtomicU64,
}

impl WorkerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last activation poll reached the job source
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Jobs whose outcome has been reported (or whose report failed)
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    pub(crate) fn job_started(&self) -> usize {
        self.in_flight.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn job_finished(&self) -> usize {
        self.handled.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }
}
