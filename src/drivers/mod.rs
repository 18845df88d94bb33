//! Provider 客户端抽象层：通过 trait 把不同厂商的问答接口统一为同一个契约
//!
//! Provider client abstraction. Each answer-generation service implements
//! [`ProviderClient`]; the fan-out streamer only sees `Arc<dyn ProviderClient>`.
//!
//! # Contract
//!
//! - Apply a bounded network timeout internally.
//! - Report transport, status and payload failures as [`ProviderOutcome::Failure`].
//! - `Err` is reserved for unexpected faults; the streamer converts it into a
//!   failed event as well, but implementations should not rely on that.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;

use crate::types::ProviderOutcome;
use crate::Result;

pub use gemini::{GeminiClient, GeminiConfig};
pub use openai::{OpenAiCompatClient, OpenAiCompatConfig};

/// Dispatch key of the Gemini provider.
pub const GEMINI_KEY: &str = "gemini";
/// Dispatch key of the OpenAI-compatible provider.
pub const OPENAI_KEY: &str = "openai";

/// Sampling temperature shared by both providers.
pub(crate) const TEMPERATURE: f64 = 0.3;
/// Output token cap shared by both providers.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 500;

/// One answer-generation service.
#[async_trait]
pub trait ProviderClient: Send + Sync + std::fmt::Debug {
    /// Human-readable provider name used in logs.
    fn name(&self) -> &str;

    /// Answer `question` under the given system instruction.
    async fn answer(&self, system_prompt: &str, question: &str) -> Result<ProviderOutcome>;
}

/// Cut long upstream error bodies down before they reach a client.
pub(crate) fn truncate_error(body: &str) -> String {
    const MAX: usize = 1024;
    let body = body.trim();
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_error_short_body() {
        assert_eq!(truncate_error("  bad key \n"), "bad key");
    }

    #[test]
    fn test_truncate_error_respects_char_boundary() {
        let body = "é".repeat(1000);
        let out = truncate_error(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 1024 + 3);
    }
}
