//! HTTP 服务层：路由、请求校验、限流与 SSE 输出。
//!
//! # HTTP Surface
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /` | Health probe, fixed JSON body |
//! | `POST /answerQuiz` | Validate, admit, then stream provider answers as SSE |
//!
//! Request order inside `POST /answerQuiz`: body validation (400) → rate-limit
//! admission (429) → fan-out. Once streaming starts the status is always 200;
//! provider failures arrive as events carrying an `error` field.

pub mod error;
pub mod handlers;
pub mod identity;

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::drivers::{GeminiClient, OpenAiCompatClient, GEMINI_KEY, OPENAI_KEY};
use crate::pipeline::FanoutStreamer;
use crate::resilience::SlidingWindowLimiter;
use crate::transport::HttpTransport;
use crate::Result;

pub use error::ApiError;
pub use identity::{client_identity, ClientIdentity};

/// Shared, read-mostly state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub streamer: Arc<FanoutStreamer>,
    pub limiter: Arc<SlidingWindowLimiter>,
}

impl AppState {
    pub fn new(streamer: FanoutStreamer, limiter: SlidingWindowLimiter) -> Self {
        Self {
            streamer: Arc::new(streamer),
            limiter: Arc::new(limiter),
        }
    }

    /// Wire the Gemini and OpenAI-compatible clients behind one shared transport.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(
            config.provider_timeout,
            config.proxy_url.as_deref(),
        )?);

        let streamer = FanoutStreamer::new()
            .with_call_timeout(config.provider_timeout)
            .with_provider(
                GEMINI_KEY,
                Arc::new(GeminiClient::new(config.gemini.clone(), transport.clone())),
            )
            .with_provider(
                OPENAI_KEY,
                Arc::new(OpenAiCompatClient::new(config.openai.clone(), transport)),
            );

        Ok(Self::new(
            streamer,
            SlidingWindowLimiter::new(config.rate_limit.clone()),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/answerQuiz", post(handlers::answer_quiz))
        .with_state(state)
}

/// Serve until `shutdown` resolves. Peer addresses are recorded for rate limiting.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        addr = %listener.local_addr()?,
        providers = ?state.streamer.provider_keys(),
        call_timeout_secs = state.streamer.call_timeout().as_secs(),
        max_requests = state.limiter.config().max_requests,
        window_secs = state.limiter.config().window.as_secs(),
        "quiz-fanout listening"
    );

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}
