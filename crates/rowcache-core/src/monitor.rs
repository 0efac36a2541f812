//! Progress reporting and cooperative cancellation for cursor advancement.
//! The cache polls the monitor while it pulls rows; callers observe progress
//! through a sink and cancel through a [`CancelHandle`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{CacheError, CacheResult};

/// One progress update: rows scanned so far out of the rows needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub fraction: f64,
    pub scanned: usize,
    pub needed: usize,
}

/// Sink for progress events. Called after every row pulled from the cursor.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Cloneable cancel flag, usable from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct ExecutionMonitor {
    cancel: CancelHandle,
    // f64 bits
    progress: Arc<AtomicU64>,
    sink: Option<ProgressSink>,
}

impl std::fmt::Debug for ExecutionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionMonitor")
            .field("canceled", &self.is_canceled())
            .field("progress", &self.progress())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl ExecutionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: ProgressSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Fails with [`CacheError::Canceled`] once cancellation was requested.
    pub fn check_canceled(&self) -> CacheResult<()> {
        if self.is_canceled() {
            return Err(CacheError::Canceled);
        }
        Ok(())
    }

    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub(crate) fn report(&self, scanned: usize, needed: usize) {
        let fraction = if needed == 0 {
            1.0
        } else {
            (scanned as f64 / needed as f64).min(1.0)
        };
        self.set_progress(fraction);
        if let Some(sink) = &self.sink {
            sink(ProgressEvent {
                fraction,
                scanned,
                needed,
            });
        }
    }

    pub fn set_progress(&self, fraction: f64) {
        let clamped = fraction.clamp(0.0, 1.0);
        self.progress.store(clamped.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_cancel_handle_shared() {
        let monitor = ExecutionMonitor::new();
        assert!(monitor.check_canceled().is_ok());

        let handle = monitor.cancel_handle();
        std::thread::spawn(move || handle.cancel()).join().unwrap();

        assert!(monitor.is_canceled());
        assert!(matches!(monitor.check_canceled(), Err(CacheError::Canceled)));
    }

    #[test]
    fn test_report_feeds_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let monitor = ExecutionMonitor::new().with_sink(Arc::new(move |ev| {
            sink_seen.lock().unwrap().push(ev.scanned);
        }));

        monitor.report(1, 4);
        assert_eq!(monitor.progress(), 0.25);
        monitor.report(4, 4);
        assert_eq!(monitor.progress(), 1.0);
        assert_eq!(*seen.lock().unwrap(), vec![1, 4]);
    }

    #[test]
    fn test_progress_is_clamped() {
        let monitor = ExecutionMonitor::new();
        monitor.set_progress(3.0);
        assert_eq!(monitor.progress(), 1.0);
        monitor.set_progress(-1.0);
        assert_eq!(monitor.progress(), 0.0);
    }
}
