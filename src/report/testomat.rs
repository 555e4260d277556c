// Testomat.io reporter - turns lifecycle callbacks into session transitions

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info};

use super::Reporter;
use crate::api::{ApiError, Transport};
use crate::config::RunScope;
use crate::session::{ReportingSession, StartOutcome};
use crate::state::{SuiteInfo, TestEvent, TestResults};

/// Adapter between framework callbacks and a [`ReportingSession`]
///
/// Reporting failures are logged and swallowed unless `strict` is set, in
/// which case they surface as errors from the callback.
pub struct TestomatReporter<T: Transport> {
    session: Arc<ReportingSession<T>>,
    scope: RunScope,
    strict: bool,
    run_title: Option<String>,
}

impl<T: Transport> TestomatReporter<T> {
    pub fn new(session: Arc<ReportingSession<T>>) -> Self {
        Self {
            session,
            scope: RunScope::default(),
            strict: false,
            run_title: None,
        }
    }

    pub fn with_scope(mut self, scope: RunScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Run title that takes precedence over suite titles
    pub fn with_run_title(mut self, title: Option<String>) -> Self {
        self.run_title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn session(&self) -> &Arc<ReportingSession<T>> {
        &self.session
    }

    fn settle<V>(&self, what: &str, result: Result<V, ApiError>) -> Result<Option<V>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.strict => {
                Err(anyhow::Error::new(e).context(format!("Testomat.io {} failed", what)))
            }
            Err(e) => {
                error!("Testomat.io {} failed, continuing without it: {}", what, e);
                Ok(None)
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if let Some(Some(duration)) = self.settle("finish", self.session.finish())? {
            info!("Testomat.io run finished after {:.3}s", duration);
        }
        Ok(())
    }
}

impl<T: Transport> Reporter for TestomatReporter<T> {
    fn on_suite_start(&self, suite: &SuiteInfo) -> Result<()> {
        let hint = self.run_title.as_deref().or(suite.title.as_deref());
        match self.settle("run creation", self.session.start(hint))? {
            Some(StartOutcome::AlreadyActive { uid }) => {
                debug!("Suite '{}' joins active run {}", suite.name, uid);
            }
            Some(StartOutcome::Disabled) => {
                debug!("Reporting disabled, suite '{}' is not reported", suite.name);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_test_end(&self, event: &TestEvent) -> Result<()> {
        self.settle("test report", self.session.report(event))?;
        Ok(())
    }

    fn on_suite_end(&self, _suite: &SuiteInfo, _results: &TestResults) -> Result<()> {
        match self.scope {
            RunScope::Suite => self.finish(),
            RunScope::Invocation => Ok(()),
        }
    }

    fn on_finish(&self, _results: &TestResults) -> Result<()> {
        self.finish()
    }
}
