//! Remote template download using reqwest.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};
use url::Url;

use kiln_core::{
    application::{ApplicationError, ports::Fetcher},
    error::KilnResult,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("kiln/", env!("CARGO_PKG_VERSION"));

/// HTTP transport for remote template files.
///
/// One GET per call, no retries. Any non-2xx status is an error. The body
/// is returned as raw bytes; no charset decoding happens here.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> KilnResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApplicationError::Network {
                url: String::new(),
                status: None,
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    pub fn with_defaults() -> KilnResult<Self> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_USER_AGENT)
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    fn fetch(&self, url: &str) -> KilnResult<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| ApplicationError::Network {
            url: url.to_string(),
            status: None,
            reason: format!("invalid URL: {}", e),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|e| ApplicationError::Network {
                url: url.to_string(),
                status: None,
                reason: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::Network {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {}", status),
            }
            .into());
        }

        let body = response.bytes().map_err(|e| ApplicationError::Network {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: format!("Failed to read response body: {}", e),
        })?;

        debug!(bytes = body.len(), "download complete");
        Ok(body.to_vec())
    }
}
