use serde::{Deserialize, Serialize};

use crate::{Error, ErrorContext, Result};

/// Fixed message returned for any malformed quiz request.
pub const INVALID_REQUEST_DETAIL: &str = "Subject and question are required";

/// Body of `POST /answerQuiz`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub question: String,
}

impl QuizRequest {
    pub fn new(subject: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            question: question.into(),
        }
    }

    /// Both fields must be present and non-empty. Whitespace counts as content.
    pub fn validate(&self) -> Result<()> {
        let missing = if self.subject.is_empty() {
            Some("request.subject")
        } else if self.question.is_empty() {
            Some("request.question")
        } else {
            None
        };

        match missing {
            Some(field) => Err(Error::validation_with_context(
                INVALID_REQUEST_DETAIL,
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("quiz_request"),
            )),
            None => Ok(()),
        }
    }
}
