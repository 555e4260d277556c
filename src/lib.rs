pub mod adapter;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod report;
pub mod session;
pub mod state;
pub mod time;

pub use api::{ApiError, Credential, ReportingClient};
pub use report::{Reporter, TestomatReporter};
pub use session::{ReportingSession, SessionState, StartOutcome};
