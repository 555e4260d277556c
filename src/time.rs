// Time sources for run timing

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock time for the reporting session
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;

    /// Local timestamp used in generated run titles
    fn local_timestamp(&self) -> String;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn local_timestamp(&self) -> String {
        chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%.3f")
            .to_string()
    }
}

/// Manually driven clock, for deterministic run durations
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute instant (may go backwards)
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn local_timestamp(&self) -> String {
        let millis = self.now_millis() as i64;
        chrono::DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| millis.to_string())
    }
}

/// Elapsed seconds between two instants, never negative
pub fn elapsed_secs(start_millis: u64, end_millis: u64) -> f64 {
    end_millis.saturating_sub(start_millis) as f64 / 1000.0
}
