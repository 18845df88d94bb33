//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint that speaks `POST /chat/completions`; the default
//! is Groq's hosted Llama model.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::{truncate_error, ProviderClient, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::transport::HttpTransport;
use crate::types::ProviderOutcome;
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl OpenAiCompatConfig {
    /// Env: `GROQ_API_KEY`, `OPENAI_COMPAT_BASE_URL`, `OPENAI_COMPAT_MODEL`.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("OPENAI_COMPAT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: env::var("OPENAI_COMPAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key: env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty()),
        }
    }
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug)]
pub struct OpenAiCompatClient {
    config: OpenAiCompatConfig,
    transport: Arc<HttpTransport>,
}

impl OpenAiCompatClient {
    pub fn new(config: OpenAiCompatConfig, transport: Arc<HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn build_body(&self, system_prompt: &str, question: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": question },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_OUTPUT_TOKENS,
        })
    }

    /// `choices[0].message.content`, trimmed.
    fn parse_answer(body: &Value) -> Option<String> {
        body.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn answer(&self, system_prompt: &str, question: &str) -> Result<ProviderOutcome> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Ok(ProviderOutcome::failure("GROQ_API_KEY is not configured"));
        };

        let start = Instant::now();
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = self.build_body(system_prompt, question);

        let response = match self
            .transport
            .post_json(&url, Some(api_key), &[], &body)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(model = self.config.model.as_str(), error = %e, "openai-compatible call failed");
                return Ok(ProviderOutcome::failure(e.to_string()));
            }
        };

        if !response.is_success() {
            info!(
                http_status = response.status,
                model = self.config.model.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "openai-compatible request rejected"
            );
            return Ok(ProviderOutcome::failure(truncate_error(&response.body)));
        }

        let answer = response
            .json()
            .ok()
            .as_ref()
            .and_then(Self::parse_answer);

        match answer {
            Some(answer) => {
                info!(
                    model = self.config.model.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "openai-compatible answer received"
                );
                Ok(ProviderOutcome::Success(answer))
            }
            None => Ok(ProviderOutcome::failure(
                "malformed chat completion payload: missing choices[0].message.content",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiCompatClient {
        let transport = Arc::new(HttpTransport::with_timeout(std::time::Duration::from_secs(5)).unwrap());
        OpenAiCompatClient::new(OpenAiCompatConfig::default(), transport)
    }

    #[test]
    fn test_build_body() {
        let body = client().build_body("sys", "q?");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "q?");
        assert_eq!(body["max_tokens"], 500);
    }

    #[test]
    fn test_parse_answer_trims() {
        let body = json!({"choices": [{"message": {"content": "  C) Redis\n"}}]});
        assert_eq!(OpenAiCompatClient::parse_answer(&body).as_deref(), Some("C) Redis"));
        assert!(OpenAiCompatClient::parse_answer(&json!({"choices": []})).is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_invocation() {
        let outcome = client().answer("sys", "q").await.unwrap();
        assert_eq!(
            outcome,
            ProviderOutcome::failure("GROQ_API_KEY is not configured")
        );
    }
}
