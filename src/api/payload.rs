// Wire payloads of the reporter API

use serde::{Deserialize, Serialize};

use crate::state::TestEvent;

/// Test status as the reporting service understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
    Skipped,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/reporter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    pub title: String,
}

/// The part of the create-run response we rely on
#[derive(Debug, Clone, Deserialize)]
pub struct RunCreated {
    #[serde(default)]
    pub uid: Option<String>,
}

/// Body of `PUT /api/reporter/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishRunRequest {
    pub status_event: String,
    pub duration: f64,
}

impl FinishRunRequest {
    pub fn finish(duration: f64) -> Self {
        Self {
            status_event: "finish".to_string(),
            duration,
        }
    }
}

/// Body of `POST /api/reporter/{uid}/testrun`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    pub suite_title: String,
    pub file: String,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl TestReport {
    /// Shape a report from an observed test event
    pub fn from_event(event: &TestEvent) -> Self {
        Self {
            title: event.display_title().to_string(),
            test_id: event.meta.id.clone(),
            suite_title: event.suite_title.clone(),
            file: event.file.clone(),
            status: event.outcome.status(),
            message: event.outcome.message(),
            stack: event.outcome.stack().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{TestMeta, TestOutcome};
    use serde_json::json;

    fn event(outcome: TestOutcome) -> TestEvent {
        TestEvent {
            name: "math::tests::addition".to_string(),
            meta: TestMeta::default(),
            suite_title: "math::tests".to_string(),
            file: "src/math/tests.rs".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_passed_report_omits_optional_fields() {
        let report = TestReport::from_event(&event(TestOutcome::Success));
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            json!({
                "title": "addition",
                "suite_title": "math::tests",
                "file": "src/math/tests.rs",
                "status": "passed"
            })
        );
    }

    #[test]
    fn test_failed_report_carries_message_and_stack() {
        let mut ev = event(TestOutcome::failure("boom", Some("frame1\nframe2\n".to_string())));
        ev.meta = TestMeta::new(Some("Verify addition"), Some("T12345"));

        let value = serde_json::to_value(TestReport::from_event(&ev)).unwrap();

        assert_eq!(value["title"], "Verify addition");
        assert_eq!(value["test_id"], "T12345");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["message"], "boom");
        assert_eq!(value["stack"], "frame1\nframe2\n");
    }

    #[test]
    fn test_report_survives_json_round_trip() {
        let mut ev = event(TestOutcome::failure("it \"broke\"\nbadly", Some("a\n".to_string())));
        ev.meta = TestMeta::new(None::<String>, Some("T1"));
        let report = TestReport::from_event(&ev);

        let text = serde_json::to_string(&report).unwrap();
        let parsed: TestReport = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, report);
    }

    #[test]
    fn test_finish_request_shape() {
        let value = serde_json::to_value(FinishRunRequest::finish(2.5)).unwrap();
        assert_eq!(value, json!({"status_event": "finish", "duration": 2.5}));
    }

    #[test]
    fn test_run_created_without_uid() {
        let created: RunCreated = serde_json::from_str(r#"{"url": "x"}"#).unwrap();
        assert!(created.uid.is_none());
    }
}
