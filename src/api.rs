//! HTTP access to the upstream news service.
//!
//! The service is treated as an opaque endpoint: one `GET` returns the whole
//! article list. Requests are never retried; a failure is reported once and
//! left to the caller.
//!
//! # Architecture
//!
//! - [`FetchNews`]: the seam the fetch lifecycle drives, so tests can swap
//!   the network for a canned outcome
//! - [`NewsClient`]: the reqwest-backed implementation, configured with an
//!   explicit credential policy instead of ambient session state

use crate::config::FeedConfig;
use crate::models::Payload;
use crate::utils::truncate_for_log;
use reqwest::header::{ACCEPT, COOKIE};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Why a fetch failed.
///
/// Every variant is presented to the reader the same way; the distinction is
/// kept for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("{0}")]
    Transport(String),

    /// The service answered outside the 2xx range.
    #[error("Request failed with status code {0}")]
    Status(u16),

    /// The configured timeout elapsed first.
    #[error("timeout exceeded")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Something that can retrieve the news list.
pub trait FetchNews: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Payload, FetchError>> + Send;
}

/// reqwest client bound to one endpoint and credential policy.
#[derive(Debug, Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    endpoint: String,
    cookie_header: Option<String>,
}

impl NewsClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            cookie_header: config.cookie_header(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether this client sends credentials with its request.
    pub fn sends_credentials(&self) -> bool {
        self.cookie_header.is_some()
    }
}

impl FetchNews for NewsClient {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<Payload, FetchError> {
        let t0 = Instant::now();
        let mut request = self.http.get(&self.endpoint).header(ACCEPT, "application/json");
        if let Some(cookies) = &self.cookie_header {
            request = request.header(COOKIE, cookies);
        }
        debug!(with_credentials = self.sends_credentials(), "Sending news request");

        let result = async {
            let response = request.send().await?.error_for_status()?;
            let body = response.text().await?;
            Ok::<_, FetchError>(body)
        }
        .await;
        let elapsed_ms = t0.elapsed().as_millis();

        match result {
            Ok(body) => {
                let payload = Payload::from_body(&body);
                info!(
                    elapsed_ms,
                    bytes = body.len(),
                    entries = ?payload.len(),
                    "Fetched news list"
                );
                debug!(body_preview = %truncate_for_log(&body, 300), "News response body");
                Ok(payload)
            }
            Err(e) => {
                error!(elapsed_ms, error = %e, "Error fetching news");
                Err(e)
            }
        }
    }
}
