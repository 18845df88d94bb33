use crate::Result;
use reqwest::Proxy;
use serde_json::Value;
use std::env;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default per-call HTTP timeout for provider requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Status and raw body of a completed provider call.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Shared HTTP client for provider calls.
///
/// Every request is bounded by the client-level timeout, so a provider can
/// never hang a fan-out indefinitely.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::new(timeout, None)
    }

    /// Build a client whose every request is bounded by `timeout`.
    ///
    /// Pool size is env-overridable via `AI_HTTP_POOL_MAX_IDLE_PER_HOST` (default 32).
    pub fn new(timeout: Duration, proxy_url: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(
                env::var("AI_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(error = %e, "ignoring invalid AI_PROXY_URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST a JSON body and return status plus raw body, whatever the status.
    pub async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<TransportResponse> {
        self.send_json(url, bearer, query, body, None).await
    }

    /// Same as [`post_json`](Self::post_json), but this one request is cut off
    /// after `timeout` instead of the client-wide limit.
    pub async fn post_json_with_timeout(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse> {
        self.send_json(url, bearer, query, body, Some(timeout)).await
    }

    async fn send_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<TransportResponse> {
        let start = Instant::now();
        let mut req = self.client.post(url).json(body);

        if let Some(key) = bearer {
            req = req.bearer_auth(key);
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let response = req
            .send()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;

        debug!(
            http_status = status,
            duration_ms = start.elapsed().as_millis() as u64,
            "provider call completed"
        );

        Ok(TransportResponse { status, body })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
