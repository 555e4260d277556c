// Reporter API - credential, transport, wire payloads and client

pub mod client;
pub mod error;
pub mod payload;
pub mod transport;

pub use client::{ReportingClient, reporter_base};
pub use error::ApiError;
pub use payload::{ReportStatus, TestReport};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

/// Environment variable holding the API key
pub const ENV_TESTOMATIO: &str = "TESTOMATIO";

/// Testomat.io API key
///
/// Never printed: `Debug` masks the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` when the key is empty or only whitespace
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// Read the key from `TESTOMATIO`
    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_TESTOMATIO).ok().and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short masked form for diagnostics
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{}***", prefix)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"***").finish()
    }
}
