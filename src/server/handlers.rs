use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ApiError, AppState, ClientIdentity};
use crate::prompt::build_system_prompt;
use crate::resilience::Admission;
use crate::types::{FanoutEvent, QuizRequest};
use crate::Error;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "quiz-fanout" }))
}

/// `POST /answerQuiz`
pub async fn answer_quiz(
    State(state): State<AppState>,
    ClientIdentity(identity): ClientIdentity,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "unreadable quiz request");
            return Err(ApiError::invalid_request());
        }
    };
    request.validate()?;

    match state.limiter.admit(&identity)? {
        Admission::Accepted { remaining } => {
            debug!(client = identity.as_str(), remaining, "request admitted");
        }
        Admission::Rejected { retry_after } => {
            warn!(
                client = identity.as_str(),
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded"
            );
            return Err(Error::RateLimited {
                identity,
                retry_after_ms: retry_after.as_millis() as u64,
            }
            .into());
        }
    }

    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        client = identity.as_str(),
        subject = request.subject.as_str(),
        "dispatching quiz question"
    );

    let system_prompt = build_system_prompt(&request.subject);
    let answers = state.streamer.stream(&system_prompt, &request.question);

    let events = answers.map(move |event| {
        if event.is_done() {
            info!(request_id = %request_id, "quiz stream completed");
        }
        Ok::<_, Infallible>(to_sse_event(&event))
    });

    Ok(Sse::new(events))
}

/// `event: <provider-or-done>` / `data: <json>`
pub fn to_sse_event(event: &FanoutEvent) -> Event {
    let data = event.data().unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.event_name()).data(data)
}
