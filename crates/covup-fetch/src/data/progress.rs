use std::sync::Arc;

/// Snapshot of a running download, handed to the progress observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes written to the staging file so far. Never decreases.
    pub bytes_received: u64,

    /// Total expected bytes, if the response carried a `Content-Length`.
    pub total_bytes: Option<u64>,

    /// Whole-number completion, capped at 100.
    ///
    /// The cap matters when a server declares a length for an encoded body
    /// and then sends more bytes than declared.
    pub percent: Option<u8>,
}

impl Progress {
    #[must_use]
    pub fn new(bytes_received: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total == 0 {
                100
            } else {
                let pct = u128::from(bytes_received) * 100 / u128::from(total);
                pct.min(100) as u8
            }
        });
        Self {
            bytes_received,
            total_bytes,
            percent,
        }
    }

    /// Returns `true` once every declared byte has arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percent == Some(100)
    }
}

/// Observer invoked with throttled progress snapshots.
pub type ProgressObserver = Arc<dyn Fn(&Progress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_unknown_without_total() {
        let p = Progress::new(512, None);
        assert_eq!(p.percent, None);
        assert!(!p.is_complete());
    }

    #[test]
    fn test_percent_floor() {
        assert_eq!(Progress::new(1, Some(3)).percent, Some(33));
        assert_eq!(Progress::new(2, Some(3)).percent, Some(66));
        assert_eq!(Progress::new(3, Some(3)).percent, Some(100));
    }

    #[test]
    fn test_percent_capped_when_body_exceeds_length() {
        let p = Progress::new(4096, Some(1024));
        assert_eq!(p.percent, Some(100));
        assert!(p.is_complete());
    }

    #[test]
    fn test_percent_zero_length() {
        assert_eq!(Progress::new(0, Some(0)).percent, Some(100));
    }

    #[test]
    fn test_percent_no_overflow() {
        assert_eq!(Progress::new(u64::MAX, Some(u64::MAX)).percent, Some(100));
        assert_eq!(Progress::new(u64::MAX / 2, Some(u64::MAX)).percent, Some(49));
    }
}
