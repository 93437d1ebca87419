use std::time::{Duration, Instant};

use crate::data::Progress;

/// Minimum spacing between two progress emissions with the same percent.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Decides which progress snapshots reach the observer.
///
/// A snapshot passes when nothing was emitted yet, when the whole-number
/// percent differs from the last emitted one, or when `interval` has elapsed.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval:     Duration,
    last_emit:    Option<Instant>,
    last_percent: Option<u8>,
}

impl Default for ProgressThrottle {
    fn default() -> Self { Self::new(PROGRESS_INTERVAL) }
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            last_percent: None,
        }
    }

    pub fn admit(&mut self, progress: &Progress, now: Instant) -> bool {
        let due = match self.last_emit {
            None => true,
            Some(last) => {
                progress.percent != self.last_percent
                    || now.saturating_duration_since(last) >= self.interval
            }
        };
        if due {
            self.last_emit = Some(now);
            self.last_percent = progress.percent;
        }
        due
    }
}
