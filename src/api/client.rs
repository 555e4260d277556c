// Reporting client - the three reporter API calls

use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use super::payload::{CreateRunRequest, FinishRunRequest, TestReport};
use super::transport::{ApiRequest, Method, Transport};
use super::{ApiError, Credential};

/// Path of the reporter API below the service url
pub const REPORTER_PATH: &str = "api/reporter";

/// Stateless client for the Testomat.io reporter API
///
/// Without a credential every call is skipped and returns `Ok(None)`.
pub struct ReportingClient<T: Transport> {
    base: Url,
    credential: Option<Credential>,
    transport: T,
}

impl<T: Transport> ReportingClient<T> {
    /// Create a client for the service at `service_url`
    pub fn new(
        service_url: &str,
        credential: Option<Credential>,
        transport: T,
    ) -> Result<Self, ApiError> {
        let base = reporter_base(service_url)?;
        if credential.is_none() {
            error!(
                "{} environment variable is not set. Testomat.io reporting will be disabled.",
                super::ENV_TESTOMATIO
            );
        }

        Ok(Self {
            base,
            credential,
            transport,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.credential.is_some()
    }

    /// Reporter API base, without credentials
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `POST {base}` - create a run titled `title`
    pub fn create_run(&self, title: &str) -> Result<Option<String>, ApiError> {
        let payload = CreateRunRequest {
            title: title.to_string(),
        };
        self.send(Method::Post, &[], "test run", &payload)
    }

    /// `POST {base}/{run_uid}/testrun` - report one test
    pub fn report_test(
        &self,
        run_uid: &str,
        report: &TestReport,
    ) -> Result<Option<String>, ApiError> {
        if run_uid.is_empty() {
            return Ok(None);
        }
        self.send(Method::Post, &[run_uid, "testrun"], "test report", report)
    }

    /// `PUT {base}/{run_uid}` - close the run
    pub fn finish_run(&self, run_uid: &str, duration: f64) -> Result<Option<String>, ApiError> {
        if run_uid.is_empty() {
            return Ok(None);
        }
        let payload = FinishRunRequest::finish(duration);
        self.send(Method::Put, &[run_uid], "finish test run", &payload)
    }

    fn send<P: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        what: &'static str,
        payload: &P,
    ) -> Result<Option<String>, ApiError> {
        let Some(credential) = &self.credential else {
            warn!(
                "API key not available. Skipping API call: {} {}",
                method.as_str(),
                self.endpoint(segments, None)?
            );
            return Ok(None);
        };

        let body = serde_json::to_vec(payload).map_err(|source| {
            warn!("Error encoding {} payload: {}", what, source);
            ApiError::Encoding { what, source }
        })?;

        let request = ApiRequest {
            method,
            url: self.endpoint(segments, Some(credential))?,
            body,
        };

        info!(
            "Executing API request: {} {}",
            method.as_str(),
            request.redacted_url()
        );
        tracing::debug!("Request Body: {}", request.body_text());

        let response = self.transport.execute(&request).inspect_err(|e| {
            error!("Network error while calling Testomat API: {}", e);
        })?;

        match response.status {
            200..=299 => {
                info!("API call successful ({}): {}", response.status, response.body);
                Ok(Some(response.body))
            }
            status => match ApiError::from_status(status, response.body) {
                Some(err) => {
                    error!("{}", err);
                    Err(err)
                }
                None => {
                    warn!("Unexpected status {} from Testomat API, ignoring", status);
                    Ok(None)
                }
            },
        }
    }

    fn endpoint(
        &self,
        segments: &[&str],
        credential: Option<&Credential>,
    ) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                url: self.base.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        if let Some(credential) = credential {
            url.query_pairs_mut()
                .append_pair("api_key", credential.expose());
        }
        Ok(url)
    }
}

/// Resolve `{service_url}/api/reporter`
pub fn reporter_base(service_url: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: service_url.to_string(),
        reason,
    };

    let mut url = Url::parse(service_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(REPORTER_PATH.split('/'));
    Ok(url)
}
