//! Gemini generateContent 客户端：依次尝试多个模型，直到有一个成功
//!
//! Google Gemini `generateContent` REST client. Differences from the
//! chat-completions client:
//! - API key is passed as `?key=` query parameter, not in headers.
//! - `generationConfig` wraps temperature and `maxOutputTokens`.
//! - Response text lives at `candidates[0].content.parts[0].text`.
//! - Model availability varies per key, so a list of `(model, api_version)`
//!   pairs is walked in order and the first usable answer wins.
//! - Each model attempt gets its own slice of the call budget, so one hanging
//!   model cannot use up the time the rest of the list needs.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{ProviderClient, GEMINI_KEY, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::transport::HttpTransport;
use crate::types::ProviderOutcome;
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Self-reported label on the all-models-failed outcome.
pub const GEMINI_LABEL: &str = "Gemini";

/// Reported when every model in the list failed.
pub const ALL_MODELS_FAILED: &str =
    "All Gemini models failed. Please check your API key and available models.";

/// A model name and the API version that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiModel {
    pub name: String,
    pub api_version: String,
}

impl GeminiModel {
    pub fn new(name: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_version: api_version.into(),
        }
    }
}

/// Preferred models, newest first.
pub fn default_models() -> Vec<GeminiModel> {
    vec![
        GeminiModel::new("gemini-2.0-flash-exp", "v1beta"),
        GeminiModel::new("gemini-1.5-flash", "v1"),
        GeminiModel::new("gemini-1.5-pro", "v1"),
        GeminiModel::new("gemini-pro", "v1"),
        GeminiModel::new("gemini-3-flash-preview", "v1beta"),
        GeminiModel::new("gemini-3-pro-preview", "v1beta"),
    ]
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub models: Vec<GeminiModel>,
    /// Per-model attempt limit. `None` splits the transport timeout evenly
    /// across the models with one share left over.
    pub attempt_timeout: Option<Duration>,
}

impl GeminiConfig {
    /// Env: `GEMINI_API_KEY`, `GEMINI_BASE_URL`, `QUIZ_PROVIDER_ATTEMPT_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            models: default_models(),
            attempt_timeout: env::var("QUIZ_PROVIDER_ATTEMPT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            models: default_models(),
            attempt_timeout: None,
        }
    }
}

#[derive(Debug)]
pub struct GeminiClient {
    config: GeminiConfig,
    transport: Arc<HttpTransport>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, transport: Arc<HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Gemini gets the instruction and the question as one user turn.
    fn build_prompt(system_prompt: &str, question: &str) -> String {
        format!("{}\n\nQuestion:\n{}", system_prompt, question)
    }

    fn build_body(prompt: &str) -> Value {
        json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        })
    }

    fn endpoint(&self, model: &GeminiModel) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model.api_version,
            model.name
        )
    }

    fn parse_answer(body: &Value) -> Option<String> {
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Time allowed for a single model before moving on to the next one.
    pub fn attempt_timeout(&self) -> Duration {
        self.config.attempt_timeout.unwrap_or_else(|| {
            let shares = u32::try_from(self.config.models.len() + 1).unwrap_or(u32::MAX);
            self.transport.timeout() / shares
        })
    }

    fn all_failed() -> ProviderOutcome {
        ProviderOutcome::Failure {
            answer: String::new(),
            error: ALL_MODELS_FAILED.to_string(),
            provider: Some(GEMINI_LABEL.to_string()),
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn name(&self) -> &str {
        GEMINI_KEY
    }

    async fn answer(&self, system_prompt: &str, question: &str) -> Result<ProviderOutcome> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Ok(ProviderOutcome::failure("GEMINI_API_KEY is not configured"));
        };

        let start = Instant::now();
        let body = Self::build_body(&Self::build_prompt(system_prompt, question));
        let attempt_timeout = self.attempt_timeout();

        for model in &self.config.models {
            let url = self.endpoint(model);
            let response = match self
                .transport
                .post_json_with_timeout(&url, None, &[("key", api_key)], &body, attempt_timeout)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(model = model.name.as_str(), error = %e, "gemini model call failed");
                    continue;
                }
            };

            if !response.is_success() {
                debug!(
                    model = model.name.as_str(),
                    http_status = response.status,
                    "gemini model unavailable, trying next"
                );
                continue;
            }

            match response.json().ok().as_ref().and_then(Self::parse_answer) {
                Some(answer) => {
                    info!(
                        model = model.name.as_str(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "gemini answer received"
                    );
                    return Ok(ProviderOutcome::Success(answer));
                }
                None => {
                    debug!(model = model.name.as_str(), "gemini payload had no text, trying next");
                }
            }
        }

        warn!(
            models_tried = self.config.models.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "all gemini models failed"
        );
        Ok(Self::all_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_build_body() {
        let body = GeminiClient::build_body(&GeminiClient::build_prompt("Be concise.", "2+2?"));
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Be concise.\n\nQuestion:\n2+2?"
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.3);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 500);
    }

    #[test]
    fn test_gemini_endpoint() {
        let transport = Arc::new(
            HttpTransport::with_timeout(std::time::Duration::from_secs(5)).unwrap(),
        );
        let client = GeminiClient::new(
            GeminiConfig {
                base_url: "http://localhost:1234/".into(),
                ..GeminiConfig::default()
            },
            transport,
        );
        assert_eq!(
            client.endpoint(&GeminiModel::new("gemini-pro", "v1")),
            "http://localhost:1234/v1/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_gemini_parse_answer() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{"text": " Redis \n"}], "role": "model" },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(GeminiClient::parse_answer(&body).as_deref(), Some("Redis"));

        let blank = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]});
        assert!(GeminiClient::parse_answer(&blank).is_none());
    }

    #[test]
    fn test_attempt_timeout_leaves_budget_for_every_model() {
        let transport = Arc::new(
            HttpTransport::with_timeout(std::time::Duration::from_secs(30)).unwrap(),
        );
        let client = GeminiClient::new(GeminiConfig::default(), transport.clone());
        let per_attempt = client.attempt_timeout();
        assert_eq!(per_attempt, Duration::from_secs(30) / 7);
        assert!(per_attempt * (client.config.models.len() as u32) < Duration::from_secs(30));

        let pinned = GeminiClient::new(
            GeminiConfig {
                attempt_timeout: Some(Duration::from_secs(3)),
                ..GeminiConfig::default()
            },
            transport,
        );
        assert_eq!(pinned.attempt_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_all_failed_self_reports_label() {
        match GeminiClient::all_failed() {
            ProviderOutcome::Failure { provider, error, .. } => {
                assert_eq!(provider.as_deref(), Some("Gemini"));
                assert_eq!(error, ALL_MODELS_FAILED);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
