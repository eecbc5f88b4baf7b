use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Handle to a running Status Poller. Cloning shares the same stop token and
/// the same count of status fetches still in flight.
#[derive(Debug, Clone, Default)]
pub struct PollTask {
    stopped: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
}

impl PollTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the poller. Returns true only for the call that actually stopped it.
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Count one status fetch as started until the returned guard is dropped.
    pub fn begin_fetch(&self) -> FetchGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        FetchGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Status fetches started and not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// One outstanding status fetch of a [`PollTask`].
#[derive(Debug)]
pub struct FetchGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
