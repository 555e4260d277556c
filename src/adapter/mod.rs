//! Framework adapters.
//!
//! Test harnesses announce their lifecycle as line-oriented JSON. A parser per
//! format turns each line into a [`FrameworkEvent`]; [`Relay`] feeds those
//! events to the reporters, opening and closing suites as needed so every
//! reporter sees a well-formed start/test/end sequence even from a truncated
//! stream.

pub mod events;
pub mod libtest;
pub mod metadata;

use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::report::Reporter;
use crate::state::{SuiteInfo, TestEvent, TestResults};

pub use events::EventStreamParser;
pub use libtest::LibtestParser;
pub use metadata::MetadataRegistry;

/// Lifecycle event decoded from one input line
#[derive(Debug, Clone, PartialEq)]
pub enum FrameworkEvent {
    SuiteStarted(SuiteInfo),
    TestStarted { name: String },
    TestFinished(TestEvent),
    SuiteFinished,
}

/// Decodes one input format
pub trait EventParser {
    /// `Ok(None)` for lines that carry no lifecycle event
    fn parse_line(&mut self, line: &str) -> Result<Option<FrameworkEvent>>;
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `cargo test -- -Z unstable-options --format json`
    Libtest,
    /// NDJSON lifecycle events (`suite_start`, `test_pass`, ...)
    Events,
}

impl InputFormat {
    pub fn parser(&self) -> Box<dyn EventParser> {
        match self {
            Self::Libtest => Box::new(LibtestParser::new()),
            Self::Events => Box::new(EventStreamParser::new()),
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "libtest" => Ok(Self::Libtest),
            "events" => Ok(Self::Events),
            other => Err(format!(
                "unknown format '{}', expected 'libtest' or 'events'",
                other
            )),
        }
    }
}

/// Drives reporters from an event stream
pub struct Relay {
    reporters: Vec<Box<dyn Reporter>>,
    metadata: MetadataRegistry,
    echo: Option<Box<dyn Write>>,
    open_suite: Option<SuiteInfo>,
    suite_results: TestResults,
    results: TestResults,
    suites_seen: usize,
}

impl Relay {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self {
            reporters,
            metadata: MetadataRegistry::default(),
            echo: None,
            open_suite: None,
            suite_results: TestResults::new(),
            results: TestResults::new(),
            suites_seen: 0,
        }
    }

    pub fn with_metadata(mut self, metadata: MetadataRegistry) -> Self {
        self.metadata = metadata;
        self
    }

    /// Copy every input line to `out`
    pub fn with_echo(mut self, out: Box<dyn Write>) -> Self {
        self.echo = Some(out);
        self
    }

    /// Consume `input` to the end and return the tally of relayed tests
    ///
    /// The open suite is closed and `on_finish` runs even when reading,
    /// parsing or a reporter fails; the first error is returned afterwards.
    pub fn run<R: BufRead>(mut self, mut input: R, parser: &mut dyn EventParser) -> Result<TestResults> {
        let started = Instant::now();
        let consumed = self.consume(&mut input, parser);

        self.results.duration_ms = started.elapsed().as_millis() as u64;
        let shutdown = self.shutdown();

        match (consumed, shutdown) {
            (Ok(()), Ok(())) => Ok(self.results),
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!("Closing the relay after an error also failed: {:#}", cleanup);
                Err(e)
            }
        }
    }

    fn consume<R: BufRead>(&mut self, input: &mut R, parser: &mut dyn EventParser) -> Result<()> {
        let mut buf = Vec::new();
        let mut index = 0;
        loop {
            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .with_context(|| format!("Failed to read input line {}", index + 1))?;
            if read == 0 {
                return Ok(());
            }
            index += 1;

            // Harness output is not guaranteed to be UTF-8
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(out) = self.echo.as_mut() {
                writeln!(out, "{}", line).context("Failed to echo input line")?;
            }
            if line.trim().is_empty() {
                continue;
            }

            let event = parser
                .parse_line(line)
                .with_context(|| format!("Invalid event on line {}", index))?;
            if let Some(event) = event {
                self.dispatch(event)?;
            }
        }
    }

    /// Close the open suite, flush the echo and notify every reporter
    fn shutdown(&mut self) -> Result<()> {
        let mut first = self.close_suite().err();
        if let Some(out) = self.echo.as_mut() {
            if let Err(e) = out.flush() {
                first.get_or_insert(anyhow::Error::new(e).context("Failed to flush echoed output"));
            }
        }
        for reporter in &self.reporters {
            if let Err(e) = reporter.on_finish(&self.results) {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn dispatch(&mut self, event: FrameworkEvent) -> Result<()> {
        match event {
            FrameworkEvent::SuiteStarted(suite) => {
                self.close_suite()?;
                self.open(suite)
            }
            FrameworkEvent::TestStarted { name } => {
                self.ensure_suite()?;
                for reporter in &self.reporters {
                    reporter.on_test_start(&name);
                }
                Ok(())
            }
            FrameworkEvent::TestFinished(mut test) => {
                self.ensure_suite()?;
                test.meta = self.metadata.resolve(&test.name, test.meta);
                self.suite_results.add(&test);
                self.results.add(&test);
                for reporter in &self.reporters {
                    reporter.on_test_end(&test)?;
                }
                Ok(())
            }
            FrameworkEvent::SuiteFinished => self.close_suite(),
        }
    }

    fn open(&mut self, suite: SuiteInfo) -> Result<()> {
        self.suites_seen += 1;
        debug!("Suite '{}' started", suite.name);
        for reporter in &self.reporters {
            reporter.on_suite_start(&suite)?;
        }
        self.suite_results = TestResults::new();
        self.open_suite = Some(suite);
        Ok(())
    }

    /// Tests seen outside any suite get an implicit one
    fn ensure_suite(&mut self) -> Result<()> {
        if self.open_suite.is_none() {
            let suite = SuiteInfo {
                name: suite_label(self.suites_seen + 1),
                ..SuiteInfo::default()
            };
            self.open(suite)?;
        }
        Ok(())
    }

    fn close_suite(&mut self) -> Result<()> {
        let Some(suite) = self.open_suite.take() else {
            return Ok(());
        };
        debug!(
            "Suite '{}' finished: {} test(s)",
            suite.name,
            self.suite_results.total()
        );
        for reporter in &self.reporters {
            reporter.on_suite_end(&suite, &self.suite_results)?;
        }
        Ok(())
    }
}

/// Name of the n-th anonymous suite
pub fn suite_label(n: usize) -> String {
    format!("suite #{}", n)
}

/// Module path of a `a::b::c` test name, if any
pub fn module_path(test_name: &str) -> Option<&str> {
    test_name.rsplit_once("::").map(|(module, _)| module)
}

/// Best-effort source file of a test
///
/// Path-like names are taken as they are. Module paths map to `src/`, with a
/// trailing `tests` module folded into its parent file.
pub fn source_file(test_name: &str) -> String {
    if test_name.contains('/') || test_name.contains('\\') {
        return test_name.to_string();
    }

    let mut segments: Vec<&str> = module_path(test_name)
        .map(|m| m.split("::").collect())
        .unwrap_or_default();
    if segments.last() == Some(&"tests") {
        segments.pop();
    }

    if segments.is_empty() {
        "src/lib.rs".to_string()
    } else {
        format!("src/{}.rs", segments.join("/"))
    }
}
