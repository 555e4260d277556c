// libtest JSON adapter (`cargo test -- -Z unstable-options --format json`)

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{EventParser, FrameworkEvent, module_path, source_file, suite_label};
use crate::state::{SuiteInfo, TestEvent, TestMeta, TestOutcome, format_stack};

static PANIC_HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PANIC_HEADER_PATTERN).expect("invalid panic header regex"));

static LEGACY_PANIC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(LEGACY_PANIC_PATTERN).expect("invalid legacy panic regex"));

/// `thread 'name' panicked at <rest>`
const PANIC_HEADER_PATTERN: &str = r"^thread '[^']*' panicked at (.+)$";

/// Pre-1.73 form: `'message', src/lib.rs:1:2`
const LEGACY_PANIC_PATTERN: &str = r"^'(.*)', (\S+)$";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LibtestLine {
    Suite(SuiteLine),
    Test(TestLine),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct SuiteLine {
    event: String,
    #[serde(default)]
    test_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TestLine {
    event: String,
    name: String,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parser for the libtest JSON format
#[derive(Debug, Default)]
pub struct LibtestParser {
    suites: usize,
}

impl LibtestParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_suite(&self) -> String {
        suite_label(self.suites.max(1))
    }

    fn finished(&self, line: TestLine, outcome: TestOutcome) -> FrameworkEvent {
        let suite_title = module_path(&line.name)
            .map(str::to_string)
            .unwrap_or_else(|| self.current_suite());
        FrameworkEvent::TestFinished(TestEvent {
            file: source_file(&line.name),
            name: line.name,
            meta: TestMeta::default(),
            suite_title,
            outcome,
        })
    }
}

impl EventParser for LibtestParser {
    fn parse_line(&mut self, line: &str) -> Result<Option<FrameworkEvent>> {
        // Harness banners and captured output share the stream
        let Ok(parsed) = serde_json::from_str::<LibtestLine>(line) else {
            debug!("Skipping non-JSON line: {}", line);
            return Ok(None);
        };

        let event = match parsed {
            LibtestLine::Suite(suite) => match suite.event.as_str() {
                "started" => {
                    self.suites += 1;
                    Some(FrameworkEvent::SuiteStarted(SuiteInfo {
                        name: suite_label(self.suites),
                        title: None,
                        test_count: suite.test_count,
                    }))
                }
                "ok" | "failed" => Some(FrameworkEvent::SuiteFinished),
                _ => None,
            },
            LibtestLine::Test(test) => match test.event.clone().as_str() {
                "started" => Some(FrameworkEvent::TestStarted { name: test.name }),
                "ok" => Some(self.finished(test, TestOutcome::Success)),
                "failed" => {
                    let outcome = failure_outcome(test.stdout.as_deref(), test.message.as_deref());
                    Some(self.finished(test, outcome))
                }
                "ignored" => {
                    let reason = test.message.clone();
                    Some(self.finished(test, TestOutcome::Disabled { reason }))
                }
                "timeout" => {
                    warn!("Test '{}' is running for over 60 seconds", test.name);
                    None
                }
                _ => None,
            },
            LibtestLine::Other => None,
        };

        Ok(event)
    }
}

/// Panic report extracted from captured test output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicReport {
    pub message: String,
    pub location: Option<String>,
    /// Frames after `stack backtrace:`, if the test ran with a backtrace
    pub backtrace: Vec<String>,
}

/// Find the panic report in a failed test's stdout
pub fn parse_panic(stdout: &str) -> Option<PanicReport> {
    let lines: Vec<&str> = stdout.lines().collect();
    let header = lines
        .iter()
        .position(|line| PANIC_HEADER_REGEX.is_match(line))?;
    let rest = PANIC_HEADER_REGEX.captures(lines[header])?.get(1)?.as_str();

    let (message, location) = if let Some(location) = rest.strip_suffix(':') {
        let message: Vec<&str> = lines[header + 1..]
            .iter()
            .take_while(|line| !line.starts_with("note: ") && !line.starts_with("stack backtrace:"))
            .copied()
            .collect();
        (message.join("\n"), Some(location.to_string()))
    } else if let Some(caps) = LEGACY_PANIC_REGEX.captures(rest) {
        (caps[1].to_string(), Some(caps[2].to_string()))
    } else {
        (rest.to_string(), None)
    };

    let backtrace = lines
        .iter()
        .position(|line| line.starts_with("stack backtrace:"))
        .map(|start| {
            lines[start + 1..]
                .iter()
                .take_while(|line| !line.starts_with("note: "))
                .map(|line| line.trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(PanicReport {
        message: message.trim().to_string(),
        location,
        backtrace,
    })
}

fn failure_outcome(stdout: Option<&str>, message: Option<&str>) -> TestOutcome {
    let stdout = stdout.unwrap_or_default();
    match parse_panic(stdout) {
        Some(panic) => {
            let stack = if !panic.backtrace.is_empty() {
                Some(format_stack(&panic.backtrace))
            } else {
                panic.location.as_ref().map(|loc| format_stack([format!("at {}", loc)]))
            };
            let message = if panic.message.is_empty() {
                message.unwrap_or("Test failed").to_string()
            } else {
                panic.message
            };
            TestOutcome::failure(message, stack)
        }
        None => {
            let stack = (!stdout.trim().is_empty()).then(|| format_stack(stdout.lines()));
            TestOutcome::failure(message.unwrap_or("Test failed"), stack)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &mut LibtestParser, line: &str) -> Option<FrameworkEvent> {
        parser.parse_line(line).expect("parse should not fail")
    }

    #[test]
    fn test_suite_events() {
        let mut parser = LibtestParser::new();

        let started = parse(&mut parser, r#"{ "type": "suite", "event": "started", "test_count": 3 }"#);
        assert_eq!(
            started,
            Some(FrameworkEvent::SuiteStarted(SuiteInfo {
                name: "suite #1".into(),
                title: None,
                test_count: Some(3),
            }))
        );

        let ended = parse(
            &mut parser,
            r#"{ "type": "suite", "event": "failed", "passed": 2, "failed": 1, "ignored": 0, "measured": 0, "filtered_out": 0, "exec_time": 0.01 }"#,
        );
        assert_eq!(ended, Some(FrameworkEvent::SuiteFinished));
    }

    #[test]
    fn test_passed_test() {
        let mut parser = LibtestParser::new();

        let event = parse(&mut parser, r#"{ "type": "test", "name": "math::tests::adds", "event": "ok" }"#);

        let Some(FrameworkEvent::TestFinished(test)) = event else {
            panic!("expected a finished test, got {:?}", event);
        };
        assert_eq!(test.name, "math::tests::adds");
        assert_eq!(test.suite_title, "math::tests");
        assert_eq!(test.file, "src/math.rs");
        assert_eq!(test.outcome, TestOutcome::Success);
    }

    #[test]
    fn test_failed_test_extracts_panic_message() {
        let mut parser = LibtestParser::new();
        let line = r#"{ "type": "test", "name": "math::divides", "event": "failed", "stdout": "thread 'math::divides' panicked at src/math.rs:12:9:\nassertion `left == right` failed\n  left: 1\n right: 2\nnote: run with `RUST_BACKTRACE=1` environment variable to display a backtrace\n" }"#;

        let Some(FrameworkEvent::TestFinished(test)) = parse(&mut parser, line) else {
            panic!("expected a finished test");
        };

        assert_eq!(
            test.outcome,
            TestOutcome::failure(
                "assertion `left == right` failed\n  left: 1\n right: 2",
                Some("at src/math.rs:12:9\n".to_string())
            )
        );
    }

    #[test]
    fn test_ignored_test_with_reason() {
        let mut parser = LibtestParser::new();

        let event = parse(
            &mut parser,
            r#"{ "type": "test", "name": "slow", "event": "ignored", "message": "needs network" }"#,
        );

        let Some(FrameworkEvent::TestFinished(test)) = event else {
            panic!("expected a finished test");
        };
        assert_eq!(
            test.outcome,
            TestOutcome::Disabled {
                reason: Some("needs network".into())
            }
        );
        assert_eq!(test.suite_title, "suite #1");
    }

    #[test]
    fn test_noise_is_skipped() {
        let mut parser = LibtestParser::new();

        assert_eq!(parse(&mut parser, "running 3 tests"), None);
        assert_eq!(parse(&mut parser, r#"{ "type": "bench", "name": "b", "median": 1, "deviation": 0 }"#), None);
        assert_eq!(parse(&mut parser, r#"{ "type": "test", "name": "t", "event": "timeout" }"#), None);
    }

    #[test]
    fn test_parse_panic_legacy_format() {
        let panic = parse_panic("thread 'main' panicked at 'boom', src/lib.rs:3:5\n").unwrap();

        assert_eq!(panic.message, "boom");
        assert_eq!(panic.location.as_deref(), Some("src/lib.rs:3:5"));
    }

    #[test]
    fn test_parse_panic_with_backtrace() {
        let stdout = "thread 't' panicked at src/lib.rs:3:5:\nboom\nstack backtrace:\n   0: rust_begin_unwind\n   1: crate::t\nnote: Some details are omitted\n";

        let panic = parse_panic(stdout).unwrap();

        assert_eq!(panic.message, "boom");
        assert_eq!(panic.backtrace, vec!["0: rust_begin_unwind", "1: crate::t"]);
        assert_eq!(
            failure_outcome(Some(stdout), None).stack(),
            Some("0: rust_begin_unwind\n1: crate::t\n")
        );
    }

    #[test]
    fn test_failure_without_panic_uses_message() {
        let outcome = failure_outcome(None, Some("note: test did not panic as expected"));

        assert_eq!(
            outcome,
            TestOutcome::failure("note: test did not panic as expected", None)
        );
    }
}
