// Report module - lifecycle observers fed by the adapter

pub mod console;
pub mod testomat;

use crate::state::{SuiteInfo, TestEvent, TestResults};
use anyhow::Result;
pub use console::ConsoleReporter;
pub use testomat::TestomatReporter;

/// Reporter trait
pub trait Reporter: Send + Sync {
    /// Called when a suite begins
    fn on_suite_start(&self, suite: &SuiteInfo) -> Result<()>;

    /// Called when a test starts
    fn on_test_start(&self, _test_name: &str) {}

    /// Called when a test finishes
    fn on_test_end(&self, event: &TestEvent) -> Result<()>;

    /// Called when a suite finishes
    fn on_suite_end(&self, suite: &SuiteInfo, results: &TestResults) -> Result<()>;

    /// Called once when the input is exhausted
    fn on_finish(&self, _results: &TestResults) -> Result<()> {
        Ok(())
    }
}
