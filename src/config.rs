//! Runtime configuration, read once from the environment at startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `QUIZ_BIND_ADDR` | `0.0.0.0:8000` |
//! | `QUIZ_RATE_LIMIT_MAX_REQUESTS` | `9` |
//! | `QUIZ_RATE_LIMIT_WINDOW_SECS` | `60` |
//! | `QUIZ_PROVIDER_TIMEOUT_SECS` | `AI_HTTP_TIMEOUT_SECS`, else `30` |
//! | `AI_PROXY_URL` | none |
//! | `GROQ_API_KEY`, `OPENAI_COMPAT_BASE_URL`, `OPENAI_COMPAT_MODEL` | see [`OpenAiCompatConfig`] |
//! | `GEMINI_API_KEY`, `GEMINI_BASE_URL`, `QUIZ_PROVIDER_ATTEMPT_TIMEOUT_SECS` | see [`GeminiConfig`] |
//!
//! Missing API keys never fail startup; the affected provider reports a
//! failure event on every request instead.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::drivers::{GeminiConfig, OpenAiCompatConfig};
use crate::resilience::SlidingWindowConfig;
use crate::transport::http::DEFAULT_TIMEOUT_SECS;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub rate_limit: SlidingWindowConfig,
    pub provider_timeout: Duration,
    pub proxy_url: Option<String>,
    pub openai: OpenAiCompatConfig,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let raw_addr = env::var("QUIZ_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse::<SocketAddr>().map_err(|e| {
            Error::configuration_with_context(
                "invalid bind address",
                ErrorContext::new()
                    .with_field_path("QUIZ_BIND_ADDR")
                    .with_details(format!("{}: {}", raw_addr, e))
                    .with_source("config"),
            )
        })?;

        let timeout_secs = env::var("QUIZ_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .or_else(|| env::var("AI_HTTP_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            bind_addr,
            rate_limit: SlidingWindowConfig::from_env(),
            provider_timeout: Duration::from_secs(timeout_secs.max(1)),
            proxy_url: env::var("AI_PROXY_URL").ok().filter(|s| !s.trim().is_empty()),
            openai: OpenAiCompatConfig::from_env(),
            gemini: GeminiConfig::from_env(),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            rate_limit: SlidingWindowConfig::default(),
            provider_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy_url: None,
            openai: OpenAiCompatConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bind_addr.port(), 8000);
        assert_eq!(cfg.rate_limit.max_requests, 9);
        assert_eq!(cfg.provider_timeout, Duration::from_secs(30));
        assert!(cfg.openai.api_key.is_none());
        assert!(cfg.gemini.api_key.is_none());
    }

    #[test]
    fn test_default_bind_addr_parses() {
        assert!(DEFAULT_BIND_ADDR.parse::<SocketAddr>().is_ok());
    }
}
