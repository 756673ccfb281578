use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use refresh_core::config::RefreshConfig;
use refresh_core::error::RefreshError;

/// Accept header for the v1 API.
pub(crate) const ACCEPT_JSON: &str = "application/json";

/// Accept header for the JSON:API REST endpoints.
pub(crate) const ACCEPT_JSON_API: &str = "application/vnd.api+json";

/// REST API version pinned for every REST call.
pub(crate) const REST_VERSION: &str = "2025-09-28";

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// HTTP client for the scanning platform API.
pub struct PlatformClient {
    client: reqwest::Client,
    base: Url,
    host: String,
    max_retries: u32,
    base_delay: Duration,
}

impl PlatformClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, RefreshError> {
        let base = Url::parse(api_url).map_err(|e| RefreshError::InvalidUrl {
            url: api_url.to_string(),
            message: e.to_string(),
        })?;
        let host = base
            .host_str()
            .ok_or_else(|| RefreshError::InvalidUrl {
                url: api_url.to_string(),
                message: "missing host".into(),
            })?
            .to_string();

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {token}")).map_err(|_| {
            RefreshError::CredentialError {
                message: "API token contains characters not allowed in a header".into(),
            }
        })?;
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("refresh/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RefreshError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base,
            host,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &RefreshConfig, token: &str) -> Result<Self, RefreshError> {
        Ok(
            Self::new(&config.api_url, token, Duration::from_secs(config.request_timeout_secs))?
                .with_retry(config.max_retries, Duration::from_secs(1)),
        )
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Host that continuation links must stay on.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    /// Build an endpoint URL from path segments (percent-encoded) and query pairs.
    pub(crate) fn endpoint(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Url, RefreshError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RefreshError::InvalidUrl {
                url: self.base.to_string(),
                message: "base URL cannot have a path".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Send a request, retrying network errors, 429 and 5xx responses with
    /// exponential backoff. Returns the final status and body; the caller
    /// decides what the status means.
    pub(crate) async fn send_with_retry(
        &self,
        method: Method,
        url: &Url,
        accept: &'static str,
    ) -> Result<(StatusCode, String), RefreshError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(%method, url = %url, attempt, "sending request");

            let result = self
                .client
                .request(method.clone(), url.clone())
                .header(header::ACCEPT, accept)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if should_retry(status) && attempt <= self.max_retries {
                        let wait = if status == StatusCode::TOO_MANY_REQUESTS {
                            resp.headers()
                                .get(header::RETRY_AFTER)
                                .and_then(|v| v.to_str().ok())
                                .and_then(parse_retry_after)
                                .unwrap_or_else(|| self.backoff(attempt))
                        } else {
                            self.backoff(attempt)
                        };
                        warn!(
                            url = %url,
                            status = status.as_u16(),
                            attempt,
                            wait_ms = wait.as_millis() as u64,
                            "transient response, retrying"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    let body = resp.text().await.map_err(|e| RefreshError::Transport {
                        message: format!("read body from {url}: {e}"),
                    })?;
                    return Ok((status, body));
                }
                Err(e) => {
                    if attempt <= self.max_retries {
                        let wait = self.backoff(attempt);
                        warn!(url = %url, error = %e, attempt, "request failed, retrying");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(RefreshError::Transport {
                        message: format!("{method} {url} failed after {attempt} attempts: {e}"),
                    });
                }
            }
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Parse a `Retry-After` value given in seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}
