use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::types::request::INVALID_REQUEST_DETAIL;
use crate::Error;

/// Body detail for rejected admissions.
pub const RATE_LIMITED_DETAIL: &str = "Too many requests - rate limit exceeded";

/// Error response returned before any streaming starts: `{"detail": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn invalid_request() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: INVALID_REQUEST_DETAIL.to_string(),
            retry_after_secs: None,
        }
    }

    pub fn rate_limited(retry_after_ms: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            detail: RATE_LIMITED_DETAIL.to_string(),
            retry_after_secs: Some(retry_after_ms.div_ceil(1000).max(1)),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { .. } => ApiError::invalid_request(),
            Error::RateLimited { retry_after_ms, .. } => ApiError::rate_limited(retry_after_ms),
            other => {
                error!(error = %other, "request failed before streaming");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: "internal error".to_string(),
                    retry_after_secs: None,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "detail": self.detail }))).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
