// Reporting API failures

use thiserror::Error;

/// Failure of a single reporting API call
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 4xx
    #[error("Testomat API call failed with status {status}: {body}")]
    Client { status: u16, body: String },

    /// HTTP 5xx
    #[error("Testomat API call failed with status {status}: {body}")]
    Server { status: u16, body: String },

    /// Connection refused, timeout, DNS failure and the like
    #[error("Testomat API connection failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Outbound payload could not be serialized
    #[error("Failed to encode {what} payload: {source}")]
    Encoding {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// 2xx response whose body is not the expected JSON
    #[error("Unexpected response from Testomat API: {0}")]
    InvalidResponse(String),

    #[error("Invalid reporting URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// Classify a non-success status; `None` for statuses that are neither 4xx nor 5xx
    pub fn from_status(status: u16, body: String) -> Option<Self> {
        match status {
            400..=499 => Some(Self::Client { status, body }),
            500..=599 => Some(Self::Server { status, body }),
            _ => None,
        }
    }

    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }

    /// HTTP status carried by the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }
}
