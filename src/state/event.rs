// Test lifecycle events as the adapter observes them

use serde::{Deserialize, Serialize};

use crate::api::ReportStatus;

/// Explicit metadata attached to a test by its author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMeta {
    /// Human readable title, overrides the function name
    #[serde(default)]
    pub title: Option<String>,
    /// Testomat.io test id, e.g. `T12345`
    #[serde(default)]
    pub id: Option<String>,
}

impl TestMeta {
    pub fn new(title: Option<impl Into<String>>, id: Option<impl Into<String>>) -> Self {
        Self {
            title: title.map(Into::into),
            id: id.map(Into::into),
        }
    }

    /// Fill fields missing here from `fallback`
    pub fn or(self, fallback: &TestMeta) -> Self {
        Self {
            title: self.title.or_else(|| fallback.title.clone()),
            id: self.id.or_else(|| fallback.id.clone()),
        }
    }
}

/// How a test ended, in framework terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Success,
    Failure {
        message: String,
        stack: Option<String>,
    },
    /// Started but gave up, e.g. a failed assumption
    Aborted { cause: String },
    /// Never run
    Disabled { reason: Option<String> },
}

impl TestOutcome {
    pub fn failure(message: impl Into<String>, stack: Option<String>) -> Self {
        Self::Failure {
            message: message.into(),
            stack,
        }
    }

    pub fn status(&self) -> ReportStatus {
        match self {
            Self::Success => ReportStatus::Passed,
            Self::Failure { .. } => ReportStatus::Failed,
            Self::Aborted { .. } | Self::Disabled { .. } => ReportStatus::Skipped,
        }
    }

    /// Message sent along with the status
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::Failure { message, .. } => Some(message.clone()),
            Self::Aborted { cause } => Some(format!("Test aborted: {}", cause)),
            Self::Disabled { reason } => Some(
                reason
                    .as_deref()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or("Test disabled")
                    .to_string(),
            ),
        }
    }

    /// Stack trace, failures only
    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Failure { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}

/// One finished test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEvent {
    /// Full framework name, e.g. `math::tests::addition`
    pub name: String,
    pub meta: TestMeta,
    pub suite_title: String,
    pub file: String,
    pub outcome: TestOutcome,
}

impl TestEvent {
    /// Last path segment of the test name
    pub fn function_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Explicit title, else the function name
    pub fn display_title(&self) -> &str {
        self.meta
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.function_name())
    }
}

/// A suite as announced by the framework
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteInfo {
    /// Framework name for the suite
    pub name: String,
    /// Suite-level title, used as the run title hint
    pub title: Option<String>,
    pub test_count: Option<usize>,
}

/// Render stack frames one per line
pub fn format_stack<I>(frames: I) -> String
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    let mut out = String::new();
    for frame in frames {
        out.push_str(&frame.to_string());
        out.push('\n');
    }
    out
}
