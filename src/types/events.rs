//! Answer events streamed to quiz clients

use serde::{Deserialize, Serialize};

/// SSE event name of the terminal marker.
pub const DONE_EVENT: &str = "done";

/// Raw result of a single provider call.
///
/// Providers report failures as data. The optional `provider` label lets a
/// provider wrapper self-report a name; the dispatch key is used when it is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Success(String),
    Failure {
        answer: String,
        error: String,
        provider: Option<String>,
    },
}

impl ProviderOutcome {
    /// Failure with an empty answer and no self-reported label.
    pub fn failure(error: impl Into<String>) -> Self {
        ProviderOutcome::Failure {
            answer: String::new(),
            error: error.into(),
            provider: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProviderOutcome::Success(_))
    }
}

/// Normalized provider result as written to the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub provider: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerEvent {
    pub fn success(provider: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            answer: answer.into(),
            error: None,
        }
    }

    pub fn failure(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            answer: String::new(),
            error: Some(error.into()),
        }
    }

    /// Normalize a provider outcome. `dispatch_key` is the fallback label only.
    pub fn from_outcome(dispatch_key: &str, outcome: ProviderOutcome) -> Self {
        match outcome {
            ProviderOutcome::Success(answer) => Self::success(dispatch_key, answer),
            ProviderOutcome::Failure {
                answer,
                error,
                provider,
            } => {
                // An empty error would leave a failed event indistinguishable from an empty answer.
                let error = if error.trim().is_empty() {
                    "provider reported an unspecified error".to_string()
                } else {
                    error
                };
                Self {
                    provider: provider.unwrap_or_else(|| dispatch_key.to_string()),
                    answer,
                    error: Some(error),
                }
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One item of a fan-out stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutEvent {
    /// Result of the provider registered under `key`.
    Answer { key: String, event: AnswerEvent },
    /// Terminal marker, always last.
    Done,
}

impl FanoutEvent {
    /// SSE `event:` name: the dispatch key, or `done`.
    pub fn event_name(&self) -> &str {
        match self {
            FanoutEvent::Answer { key, .. } => key,
            FanoutEvent::Done => DONE_EVENT,
        }
    }

    /// SSE `data:` payload. The terminal marker carries an empty object.
    pub fn data(&self) -> serde_json::Result<String> {
        match self {
            FanoutEvent::Answer { event, .. } => serde_json::to_string(event),
            FanoutEvent::Done => Ok("{}".to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, FanoutEvent::Done)
    }

    pub fn answer(&self) -> Option<&AnswerEvent> {
        match self {
            FanoutEvent::Answer { event, .. } => Some(event),
            FanoutEvent::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_error_field() {
        let event = AnswerEvent::from_outcome("gemini", ProviderOutcome::Success("C) Redis".into()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"provider": "gemini", "answer": "C) Redis"}));
    }

    #[test]
    fn test_failure_keeps_self_reported_label() {
        let outcome = ProviderOutcome::Failure {
            answer: String::new(),
            error: "all models failed".into(),
            provider: Some("Gemini".into()),
        };
        let event = AnswerEvent::from_outcome("gemini", outcome);
        assert_eq!(event.provider, "Gemini");
        assert_eq!(event.error.as_deref(), Some("all models failed"));
    }

    #[test]
    fn test_failure_falls_back_to_dispatch_key() {
        let event = AnswerEvent::from_outcome("openai", ProviderOutcome::failure("HTTP 401"));
        assert_eq!(event.provider, "openai");
        assert_eq!(event.answer, "");
        assert!(event.is_error());
    }

    #[test]
    fn test_blank_error_is_replaced() {
        let event = AnswerEvent::from_outcome("openai", ProviderOutcome::failure("  "));
        assert!(!event.error.unwrap().trim().is_empty());
    }

    #[test]
    fn test_wire_payload_round_trips() {
        let events = [
            AnswerEvent::success("openai", "C) Redis"),
            AnswerEvent::failure("gemini", "timed out"),
        ];
        for original in events {
            let frame = FanoutEvent::Answer {
                key: original.provider.clone(),
                event: original.clone(),
            };
            let decoded: AnswerEvent = serde_json::from_str(&frame.data().unwrap()).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_done_marker_payload() {
        assert_eq!(FanoutEvent::Done.event_name(), "done");
        assert_eq!(FanoutEvent::Done.data().unwrap(), "{}");
        assert!(FanoutEvent::Done.answer().is_none());
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let event: AnswerEvent = serde_json::from_str(r#"{"provider":"openai"}"#).unwrap();
        assert_eq!(event.answer, "");
        assert!(event.error.is_none());
    }
}
