use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::debug;

/// Deadline applied to each request unless the caller picks another one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Substrings that identify a request the device answered with garbage, or
/// a URL that could not be turned into a request at all. hyper reports
/// response parse failures as "invalid HTTP version parsed", "invalid HTTP
/// header parsed", "invalid HTTP status-code parsed" and so on; keep these in
/// step with hyper's `Parse` error messages when upgrading reqwest.
const MALFORMED_MARKERS: &[&str] = &["malformed", "invalid HTTP", "invalid URI"];

/// Blocking HTTP client shared by the device drivers.
#[derive(Clone, Debug)]
pub struct DeviceClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl Default for DeviceClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl DeviceClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Send a GET and hand back the raw reqwest outcome so callers can
    /// inspect transport errors themselves.
    pub fn send(&self, url: &str) -> reqwest::Result<reqwest::blocking::Response> {
        debug!(target: "atlona::http", "GET {} (timeout {:?})", url, self.timeout);
        self.client.get(url).timeout(self.timeout).send()
    }

    /// GET `url` and return the response body.
    pub fn get_body(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).context("error when making call")?;
        read_body(response)
    }
}

/// Read a response body, turning non-success statuses into errors.
pub fn read_body(response: reqwest::blocking::Response) -> Result<Vec<u8>> {
    let status = response.status();
    let body = response
        .bytes()
        .with_context(|| format!("unable to read response body (status {})", status.as_u16()))?;

    if !status.is_success() {
        bail!(
            "request status {}: {}. Response body: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            String::from_utf8_lossy(&body)
        );
    }

    Ok(body.to_vec())
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).with_context(|| {
        format!(
            "parsing response as json: {}",
            String::from_utf8_lossy(body)
        )
    })
}

/// True when the request failed because the URL could not be built or the
/// device sent back something that is not valid HTTP.
pub fn is_malformed(err: &reqwest::Error) -> bool {
    if err.is_builder() {
        return true;
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if MALFORMED_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
        {
            return true;
        }
        source = cause.source();
    }

    false
}
