// Console reporter - per-test lines and a closing summary on stderr

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use console::{Term, style};

use super::Reporter;
use crate::state::{SuiteInfo, TestEvent, TestOutcome, TestResults};

/// Console reporter
pub struct ConsoleReporter {
    term: Term,
    verbose: bool,
    suites: AtomicUsize,
}

impl ConsoleReporter {
    /// Create new console reporter
    pub fn new(verbose: bool) -> Self {
        Self {
            term: Term::stderr(),
            verbose,
            suites: AtomicUsize::new(0),
        }
    }

    /// One line describing a finished test
    pub fn format_test_line(event: &TestEvent) -> String {
        let title = event.display_title();
        match &event.outcome {
            TestOutcome::Success => format!("{} {}", style("✅ PASS").green(), title),
            TestOutcome::Failure { message, .. } => format!(
                "{} {} - {}",
                style("❌ FAIL").red(),
                title,
                first_line(message)
            ),
            outcome => format!(
                "{} {} - {}",
                style("⏭️  SKIP").yellow(),
                title,
                outcome.message().unwrap_or_default()
            ),
        }
    }

    /// Print summary
    pub fn print_summary(&self, results: &TestResults) {
        let line = "─".repeat(80);
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&"═".repeat(80));
        if results.failed() > 0 {
            let _ = self.term.write_line(&format!(
                "{} ({} failed, {} passed in {}ms)",
                style("❌ FAILED").red().bold(),
                results.failed(),
                results.passed(),
                results.duration_ms
            ));
        } else {
            let _ = self.term.write_line(&format!(
                "{} ({} passed in {}ms)",
                style("✅ PASSED").green().bold(),
                results.passed(),
                results.duration_ms
            ));
        }
        let _ = self.term.write_line(&line);
        let _ = self.term.write_line("📊 Relayed tests:");
        let _ = self.term.write_line(&format!("   • Suites: {}", self.suites.load(Ordering::SeqCst)));
        let _ = self.term.write_line(&format!("   • Total tests: {}", results.total()));
        let _ = self.term.write_line(&format!("   • Passed: {}", results.passed()));
        let _ = self.term.write_line(&format!("   • Failed: {}", results.failed()));
        let _ = self.term.write_line(&format!("   • Skipped: {}", results.skipped()));
        let _ = self.term.write_line(&format!("   • Pass rate: {:.1}%", results.pass_rate()));

        if !results.failures().is_empty() {
            let _ = self.term.write_line(&line);
            let _ = self.term.write_line("Failed tests:");
            for name in results.failures() {
                let _ = self.term.write_line(&format!("   • {}", name));
            }
        }
        let _ = self.term.write_line(&"═".repeat(80));
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

impl Reporter for ConsoleReporter {
    fn on_suite_start(&self, suite: &SuiteInfo) -> Result<()> {
        self.suites.fetch_add(1, Ordering::SeqCst);
        if self.verbose {
            let _ = self.term.write_line(&format!("▶ {}", suite.name));
        }
        Ok(())
    }

    fn on_test_end(&self, event: &TestEvent) -> Result<()> {
        let _ = self.term.write_line(&Self::format_test_line(event));
        Ok(())
    }

    fn on_suite_end(&self, _suite: &SuiteInfo, _results: &TestResults) -> Result<()> {
        Ok(())
    }

    fn on_finish(&self, results: &TestResults) -> Result<()> {
        self.print_summary(results);
        Ok(())
    }
}
