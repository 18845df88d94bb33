//! quiz-fanout server binary
//!
//! Usage:
//!   quiz-fanout            Serve on `QUIZ_BIND_ADDR` (default 0.0.0.0:8000)
//!
//! Reads `.env` from the working directory when present. Log verbosity follows
//! `RUST_LOG` (default `info`).

use anyhow::Context;
use quiz_fanout::config::AppConfig;
use quiz_fanout::server::{self, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env in the working directory.
    let _ = dotenvy::dotenv();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();

    let config = AppConfig::from_env().context("loading configuration")?;
    if config.openai.api_key.is_none() {
        info!("GROQ_API_KEY not set; openai events will report an error");
    }
    if config.gemini.api_key.is_none() {
        info!("GEMINI_API_KEY not set; gemini events will report an error");
    }

    let state = AppState::from_config(&config).context("building providers")?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    server::serve(listener, state, shutdown_signal()).await?;
    info!("quiz-fanout stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
