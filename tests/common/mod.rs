// Shared test doubles for the reporter API

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use testomat_reporter::api::{ApiError, ApiRequest, ApiResponse, Credential, ReportingClient, Transport};
use testomat_reporter::session::ReportingSession;
use testomat_reporter::state::{TestEvent, TestMeta, TestOutcome};
use testomat_reporter::time::ManualClock;

#[derive(Default)]
struct Inner {
    replies: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<ApiRequest>>,
}

/// Records every request and answers from a script (200 `{}` once it runs out)
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Inner>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.inner
            .replies
            .lock()
            .unwrap()
            .push_back((status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    /// `METHOD path` of each request, without host and query
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
            .collect()
    }

    pub fn body_json(&self, index: usize) -> serde_json::Value {
        serde_json::from_slice(&self.requests()[index].body).expect("request body is JSON")
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        let (status, body) = self
            .inner
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((200, "{}".to_string()));
        Ok(ApiResponse { status, body })
    }
}

pub const SERVICE_URL: &str = "https://app.testomat.io";

/// Session with a credential, a recording transport and a manual clock at 1000 ms
pub fn session_with(
    transport: &RecordingTransport,
    credential: Option<&str>,
) -> (Arc<ReportingSession<RecordingTransport>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let client = ReportingClient::new(
        SERVICE_URL,
        credential.and_then(Credential::new),
        transport.clone(),
    )
    .expect("valid service url");
    let session = ReportingSession::new(client).with_clock(clock.clone());
    (Arc::new(session), clock)
}

pub fn test_event(name: &str, outcome: TestOutcome) -> TestEvent {
    TestEvent {
        name: name.to_string(),
        meta: TestMeta::default(),
        suite_title: "TestomatExampleTest".to_string(),
        file: "tests/example.rs".to_string(),
        outcome,
    }
}
