// State module - observed test events and their tally

pub mod event;

pub use event::{SuiteInfo, TestEvent, TestMeta, TestOutcome, format_stack};

use crate::api::ReportStatus;

/// Running tally of relayed tests
#[derive(Debug, Clone, Default)]
pub struct TestResults {
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    failures: Vec<String>,
    /// Wall time of the observed run
    pub duration_ms: u64,
}

impl TestResults {
    /// Create new test results
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished test
    pub fn add(&mut self, event: &TestEvent) {
        self.total += 1;

        match event.outcome.status() {
            ReportStatus::Passed => self.passed += 1,
            ReportStatus::Failed => {
                self.failed += 1;
                self.failures.push(event.name.clone());
            }
            ReportStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Names of the failed tests, in arrival order
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Check if all tests passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Get pass rate
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}
