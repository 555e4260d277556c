// NDJSON lifecycle stream adapter
//
// Accepts the streaming output of grpctestify (`--stream`) and any harness
// emitting the same events:
//   {"event":"suite_start","suite":"api","title":"Nightly API run"}
//   {"event":"test_fail","testId":"api::users","message":"boom","stack":"..."}
//   {"event":"suite_end"}

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{EventParser, FrameworkEvent, module_path, source_file, suite_label};
use crate::state::{SuiteInfo, TestEvent, TestMeta, TestOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamLine {
    event: String,
    #[serde(default)]
    test_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    suite: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stack: Option<String>,
    #[serde(default)]
    test_count: Option<usize>,
}

impl StreamLine {
    /// `testId`, falling back to `name`
    fn test_name(&mut self) -> Option<String> {
        self.test_id
            .take()
            .or_else(|| self.name.take())
            .filter(|n| !n.is_empty())
    }
}

/// Test ids may be written as numbers
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    }))
}

/// Parser for NDJSON lifecycle events
#[derive(Debug, Default)]
pub struct EventStreamParser {
    suites: usize,
    current_suite: Option<String>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn finished(&self, mut line: StreamLine, outcome: TestOutcome) -> Result<FrameworkEvent> {
        let Some(name) = line.test_name() else {
            bail!("'{}' event without testId", line.event);
        };

        let suite_title = line
            .suite
            .or_else(|| self.current_suite.clone())
            .or_else(|| module_path(&name).map(str::to_string))
            .unwrap_or_else(|| suite_label(self.suites.max(1)));
        let file = line.file.unwrap_or_else(|| source_file(&name));

        Ok(FrameworkEvent::TestFinished(TestEvent {
            meta: TestMeta {
                title: line.title,
                id: line.id,
            },
            name,
            suite_title,
            file,
            outcome,
        }))
    }
}

impl EventParser for EventStreamParser {
    fn parse_line(&mut self, line: &str) -> Result<Option<FrameworkEvent>> {
        // Only lines that are not event objects count as harness noise
        let value = match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) if value.get("event").is_some() => value,
            _ => {
                debug!("Skipping non-event line: {}", line);
                return Ok(None);
            }
        };
        let mut parsed: StreamLine =
            serde_json::from_value(value).context("Malformed lifecycle event")?;

        let kind = parsed.event.clone();
        let event = match kind.as_str() {
            "suite_start" => {
                self.suites += 1;
                let name = parsed
                    .suite
                    .clone()
                    .unwrap_or_else(|| suite_label(self.suites));
                self.current_suite = parsed.suite;
                Some(FrameworkEvent::SuiteStarted(SuiteInfo {
                    name,
                    title: parsed.title,
                    test_count: parsed.test_count,
                }))
            }
            "suite_end" => {
                self.current_suite = None;
                Some(FrameworkEvent::SuiteFinished)
            }
            "test_start" => parsed
                .test_name()
                .map(|name| FrameworkEvent::TestStarted { name }),
            "test_pass" => Some(self.finished(parsed, TestOutcome::Success)?),
            "test_fail" => {
                let message = parsed.message.clone().unwrap_or_else(|| "Test failed".to_string());
                let stack = parsed.stack.clone();
                Some(self.finished(parsed, TestOutcome::failure(message, stack))?)
            }
            "test_abort" => {
                let cause = parsed.message.clone().unwrap_or_default();
                Some(self.finished(parsed, TestOutcome::Aborted { cause })?)
            }
            "test_skip" => {
                let reason = parsed.message.clone();
                Some(self.finished(parsed, TestOutcome::Disabled { reason })?)
            }
            other => {
                debug!("Ignoring unknown event '{}'", other);
                None
            }
        };

        Ok(event)
    }
}
