//! Reporting session: the run lifecycle shared by all reporters.
//!
//! A session is `Idle` until a run is created, `Active` while it accepts test
//! reports, and back to `Idle` once the run is finished or reset. Every
//! transition, including its HTTP round-trip, runs under one lock, so
//! concurrent suites can neither double-create a run nor report into a run
//! that is being finished.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::api::{ApiError, ReportingClient, TestReport, Transport};
use crate::api::payload::RunCreated;
use crate::config::default_title_prefix;
use crate::state::TestEvent;
use crate::time::{Clock, SystemClock, elapsed_secs};

/// The run a session is currently reporting into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRun {
    pub uid: String,
    pub title: String,
    pub started_at_ms: u64,
}

/// Session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Active(ActiveRun),
}

/// Result of [`ReportingSession::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A run was created and the session is now active
    Created { uid: String },
    /// A run is already active; nothing was sent
    AlreadyActive { uid: String },
    /// No credential; nothing was sent
    Disabled,
    /// The service answered without a run uid
    MissingUid,
}

/// Result of [`ReportingSession::report`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent,
    /// No active run; the event was dropped
    Dropped,
}

pub struct ReportingSession<T: Transport> {
    client: ReportingClient<T>,
    clock: Arc<dyn Clock>,
    title_prefix: String,
    state: Mutex<SessionState>,
}

impl<T: Transport> ReportingSession<T> {
    pub fn new(client: ReportingClient<T>) -> Self {
        Self {
            client,
            clock: Arc::new(SystemClock),
            title_prefix: default_title_prefix(),
            state: Mutex::new(SessionState::Idle),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Prefix of generated run titles
    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    pub fn client(&self) -> &ReportingClient<T> {
        &self.client
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.lock(), SessionState::Active(_))
    }

    pub fn run_uid(&self) -> Option<String> {
        match &*self.lock() {
            SessionState::Active(run) => Some(run.uid.clone()),
            SessionState::Idle => None,
        }
    }

    /// Create a run unless one is already active
    ///
    /// `title_hint` wins over the generated `"{prefix} {timestamp}"` title.
    pub fn start(&self, title_hint: Option<&str>) -> Result<StartOutcome, ApiError> {
        let mut state = self.lock();
        if let SessionState::Active(run) = &*state {
            return Ok(StartOutcome::AlreadyActive {
                uid: run.uid.clone(),
            });
        }

        let started_at_ms = self.clock.now_millis();
        let title = match title_hint.map(str::trim).filter(|t| !t.is_empty()) {
            Some(hint) => hint.to_string(),
            None => format!("{} {}", self.title_prefix, self.clock.local_timestamp()),
        };

        info!("Creating Testomat.io test run: {}", title);
        let Some(body) = self.client.create_run(&title)? else {
            return Ok(StartOutcome::Disabled);
        };

        let created: RunCreated = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", e, body)))?;

        match created.uid.filter(|uid| !uid.is_empty()) {
            Some(uid) => {
                info!("Testomat.io run created with UID: {}", uid);
                *state = SessionState::Active(ActiveRun {
                    uid: uid.clone(),
                    title,
                    started_at_ms,
                });
                Ok(StartOutcome::Created { uid })
            }
            None => {
                warn!("Testomat.io response has no run uid, reporting stays off: {}", body);
                Ok(StartOutcome::MissingUid)
            }
        }
    }

    /// Send one test result into the active run
    ///
    /// A failed call leaves the run active.
    pub fn report(&self, event: &TestEvent) -> Result<ReportOutcome, ApiError> {
        let state = self.lock();
        let SessionState::Active(run) = &*state else {
            warn!(
                "Testomat.io run UID is not initialized. Skipping test report for {}",
                event.name
            );
            return Ok(ReportOutcome::Dropped);
        };

        let report = TestReport::from_event(event);
        info!(
            "Reporting test '{}' with status '{}' to Testomat.io",
            report.title, report.status
        );
        self.client.report_test(&run.uid, &report)?;
        Ok(ReportOutcome::Sent)
    }

    /// Close the active run and return its duration in seconds
    ///
    /// The session is back to idle afterwards even when the call fails.
    pub fn finish(&self) -> Result<Option<f64>, ApiError> {
        let mut state = self.lock();
        let SessionState::Active(run) = std::mem::take(&mut *state) else {
            return Ok(None);
        };

        let now = self.clock.now_millis();
        let duration = elapsed_secs(run.started_at_ms, now);
        info!(
            "Finishing Testomat.io test run {} with duration {}ms",
            run.uid,
            now.saturating_sub(run.started_at_ms)
        );
        self.client.finish_run(&run.uid, duration)?;
        Ok(Some(duration))
    }

    /// Forget the active run without telling the service
    pub fn reset(&self) {
        let mut state = self.lock();
        if let SessionState::Active(run) = &*state {
            warn!("Dropping Testomat.io run {} without finishing it", run.uid);
        }
        *state = SessionState::Idle;
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
