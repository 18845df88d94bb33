//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mockito::{Matcher, Mock, Server, ServerGuard};
use quiz_fanout::drivers::ProviderClient;
use quiz_fanout::server::{self, AppState};
use quiz_fanout::types::ProviderOutcome;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Test fixture that manages a mock provider server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Mock a chat-completions response
    pub async fn mock_chat(&self, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock a Gemini generateContent response for one model
    pub async fn mock_gemini(&self, api_version: &str, model: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(
                "POST",
                format!("/{}/models/{}:generateContent", api_version, model).as_str(),
            )
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn chat_completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

pub fn gemini_response(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// Provider that answers after a fixed delay
#[derive(Debug)]
pub struct DelayedProvider {
    pub delay: Duration,
    pub outcome: ProviderOutcome,
}

impl DelayedProvider {
    pub fn answering(delay_ms: u64, answer: &str) -> Arc<dyn ProviderClient> {
        Arc::new(Self {
            delay: Duration::from_millis(delay_ms),
            outcome: ProviderOutcome::Success(answer.to_string()),
        })
    }

    pub fn failing(delay_ms: u64, error: &str) -> Arc<dyn ProviderClient> {
        Arc::new(Self {
            delay: Duration::from_millis(delay_ms),
            outcome: ProviderOutcome::failure(error),
        })
    }
}

#[async_trait]
impl ProviderClient for DelayedProvider {
    fn name(&self) -> &str {
        "delayed"
    }

    async fn answer(&self, _system_prompt: &str, _question: &str) -> quiz_fanout::Result<ProviderOutcome> {
        tokio::time::sleep(self.delay).await;
        Ok(self.outcome.clone())
    }
}

/// Start the HTTP server on an ephemeral port and return its base URL
pub async fn spawn_app(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(server::serve(listener, state, std::future::pending()));
    format!("http://{}", addr)
}

/// Provider that counts how often it is invoked
#[derive(Debug, Default)]
pub struct CountingProvider {
    pub calls: AtomicUsize,
}

impl CountingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn answer(&self, _system_prompt: &str, _question: &str) -> quiz_fanout::Result<ProviderOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderOutcome::Success("counted".into()))
    }
}

/// Minimal Gemini endpoint: requests whose path contains `hang_model` are
/// accepted but never answered, every other model answers with `answer`.
pub async fn spawn_gemini_with_hanging_model(hang_model: &'static str, answer: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let body = gemini_response(answer);

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((mut socket, _)) = listener.accept().await {
            let head = read_request(&mut socket).await;
            if head.contains(hang_model) {
                held.push(socket);
                continue;
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}

/// Read one HTTP request (headers plus `content-length` body) and return its head.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let head = text[..end].to_string();
            let body_len = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return head;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// One parsed SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

pub fn parse_frames(body: &str) -> Vec<Frame> {
    body.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut event = String::new();
            let mut data = String::new();
            for line in block.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    event = v.trim().to_string();
                } else if let Some(v) = line.strip_prefix("data:") {
                    data = v.trim().to_string();
                }
            }
            Frame { event, data }
        })
        .collect()
}
