use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use crate::core::ProgressThrottle;
use crate::data::{Progress, ProgressObserver};

/// Feeds throttled snapshots to the caller's observer.
///
/// The observer is outside our control: a panic inside it is caught, logged
/// once, and the observer is not called again for this download.
pub(crate) struct ProgressReporter {
    observer: Option<ProgressObserver>,
    throttle: ProgressThrottle,
    last:     Option<Progress>,
}

impl ProgressReporter {
    pub(crate) fn new(observer: Option<ProgressObserver>) -> Self {
        Self {
            observer,
            throttle: ProgressThrottle::default(),
            last: None,
        }
    }

    pub(crate) fn report(&mut self, progress: Progress) {
        if self.observer.is_none() || !self.throttle.admit(&progress, Instant::now()) {
            return;
        }
        self.emit(progress);
    }

    /// Deliver the final snapshot unless it was the last one emitted.
    pub(crate) fn finish(&mut self, progress: Progress) {
        if self.last != Some(progress) {
            self.emit(progress);
        }
    }

    fn emit(&mut self, progress: Progress) {
        let Some(observer) = self.observer.as_ref() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| observer(&progress))).is_err() {
            tracing::warn!("progress observer panicked; further progress updates are dropped");
            self.observer = None;
            return;
        }
        self.last = Some(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn recording() -> (ProgressObserver, Arc<Mutex<Vec<Progress>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: ProgressObserver = Arc::new(move |p: &Progress| sink.lock().unwrap().push(*p));
        (observer, seen)
    }

    #[test]
    fn test_finish_always_delivers_final_snapshot() {
        let (observer, seen) = recording();
        let mut reporter = ProgressReporter::new(Some(observer));
        reporter.report(Progress::new(1, None));
        reporter.report(Progress::new(2, None));
        reporter.finish(Progress::new(3, None));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().unwrap().bytes_received, 1);
        assert_eq!(seen.last().unwrap().bytes_received, 3);
    }

    #[test]
    fn test_finish_does_not_duplicate() {
        let (observer, seen) = recording();
        let mut reporter = ProgressReporter::new(Some(observer));
        reporter.report(Progress::new(10, Some(10)));
        reporter.finish(Progress::new(10, Some(10)));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_panicking_observer_is_disabled() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let observer: ProgressObserver = Arc::new(move |_: &Progress| {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("observer failure");
        });
        let mut reporter = ProgressReporter::new(Some(observer));
        reporter.report(Progress::new(1, Some(100)));
        reporter.report(Progress::new(50, Some(100)));
        reporter.finish(Progress::new(100, Some(100)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_without_observer_is_noop() {
        let mut reporter = ProgressReporter::new(None);
        reporter.report(Progress::new(1, None));
        reporter.finish(Progress::new(1, None));
    }
}
