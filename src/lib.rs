//! # quiz-fanout
//!
//! 这是一个把同一道测验题同时发送给两个 AI provider，并按完成顺序流式返回答案的服务。
//!
//! Quiz answering service that sends one question to two answer-generation
//! providers at the same time and streams each answer back over Server-Sent
//! Events as soon as it is ready.
//!
//! ## Overview
//!
//! - **Fan-out**: both provider calls start together; the slower one never
//!   delays the faster one's event
//! - **Failure isolation**: a timed-out, rejected or crashing provider becomes
//!   an event with an `error` field, the other provider is unaffected
//! - **Admission control**: a per-client sliding-window limiter runs before any
//!   provider is contacted
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quiz_fanout::config::AppConfig;
//! use quiz_fanout::server::{self, AppState};
//!
//! #[tokio::main]
//! async fn main() -> quiz_fanout::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let state = AppState::from_config(&config)?;
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//!     server::serve(listener, state, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | Concurrent fan-out and the per-request answer stream |
//! | [`resilience`] | Per-client sliding-window rate limiter |
//! | [`drivers`] | Provider client trait plus Gemini and OpenAI-compatible clients |
//! | [`server`] | axum routes, validation, SSE encoding |
//! | [`types`] | Request, outcome and event types |
//! | [`transport`] | Shared reqwest client |
//! | [`config`] | Environment configuration |

pub mod config;
pub mod drivers;
pub mod pipeline;
pub mod prompt;
pub mod resilience;
pub mod server;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use drivers::ProviderClient;
pub use pipeline::{AnswerStream, FanoutState, FanoutStreamer};
pub use resilience::{Admission, SlidingWindowConfig, SlidingWindowLimiter};
pub use types::{AnswerEvent, FanoutEvent, ProviderOutcome, QuizRequest};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
