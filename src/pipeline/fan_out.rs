use futures::future::BoxFuture;
use futures::stream::{FusedStream, FuturesUnordered};
use futures::{FutureExt, Stream, StreamExt};
use std::any::Any;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::drivers::ProviderClient;
use crate::transport::http::DEFAULT_TIMEOUT_SECS;
use crate::types::{AnswerEvent, FanoutEvent, ProviderOutcome};

/// How a single provider call ended.
#[derive(Debug)]
enum CallResult {
    Finished(crate::Result<ProviderOutcome>),
    TimedOut(Duration),
    Panicked(String),
}

type PendingCall = BoxFuture<'static, (String, CallResult)>;

/// Progress of one [`AnswerStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutState {
    /// Provider calls still outstanding.
    Pending { outstanding: usize },
    /// Every provider event has been yielded; the terminal marker has not.
    Settled,
    /// Terminal marker yielded, stream exhausted.
    Done,
}

/// Dispatches one question to every registered provider at once.
///
/// The streamer itself is shared across requests; each call to [`stream`](Self::stream)
/// starts a fresh set of provider calls and returns a single-use [`AnswerStream`].
#[derive(Debug, Clone)]
pub struct FanoutStreamer {
    providers: Vec<(String, Arc<dyn ProviderClient>)>,
    call_timeout: Duration,
}

impl FanoutStreamer {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            call_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Register a provider under `key`. Re-registering a key replaces the client.
    pub fn with_provider(mut self, key: impl Into<String>, client: Arc<dyn ProviderClient>) -> Self {
        let key = key.into();
        match self.providers.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = client,
            None => self.providers.push((key, client)),
        }
        self
    }

    /// Upper bound for each provider call, applied independently per provider.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn provider_keys(&self) -> Vec<&str> {
        self.providers.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Start every provider call now and return their events in completion order.
    ///
    /// Must be called from within a tokio runtime. Calls are spawned as tasks, so
    /// dropping the returned stream does not cancel them; each still ends at its timeout.
    pub fn stream(&self, system_prompt: &str, question: &str) -> AnswerStream {
        let system_prompt: Arc<str> = Arc::from(system_prompt);
        let question: Arc<str> = Arc::from(question);
        let timeout = self.call_timeout;

        let pending: FuturesUnordered<PendingCall> = self
            .providers
            .iter()
            .map(|(key, client)| {
                debug!(provider = key.as_str(), client = client.name(), "dispatching provider call");
                let client = client.clone();
                let system_prompt = system_prompt.clone();
                let question = question.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(timeout, client.answer(&system_prompt, &question)).await
                });

                let key = key.clone();
                async move {
                    let result = match handle.await {
                        Ok(Ok(outcome)) => CallResult::Finished(outcome),
                        Ok(Err(_elapsed)) => CallResult::TimedOut(timeout),
                        Err(e) => CallResult::Panicked(join_error_message(e)),
                    };
                    (key, result)
                }
                .boxed()
            })
            .collect();

        AnswerStream {
            pending,
            started: Instant::now(),
            terminated: false,
        }
    }
}

impl Default for FanoutStreamer {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-pass stream of one request's provider events followed by [`FanoutEvent::Done`].
pub struct AnswerStream {
    pending: FuturesUnordered<PendingCall>,
    started: Instant,
    terminated: bool,
}

impl AnswerStream {
    pub fn state(&self) -> FanoutState {
        if self.terminated {
            FanoutState::Done
        } else if self.pending.is_empty() {
            FanoutState::Settled
        } else {
            FanoutState::Pending {
                outstanding: self.pending.len(),
            }
        }
    }
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("state", &self.state())
            .finish()
    }
}

impl Stream for AnswerStream {
    type Item = FanoutEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }

        if !this.pending.is_empty() {
            match this.pending.poll_next_unpin(cx) {
                Poll::Ready(Some((key, result))) => {
                    let event = normalize(&key, result);
                    let elapsed_ms = this.started.elapsed().as_millis() as u64;
                    match &event.error {
                        None => info!(provider = key.as_str(), elapsed_ms, "provider answered"),
                        Some(error) => warn!(
                            provider = key.as_str(),
                            elapsed_ms,
                            error = error.as_str(),
                            "provider failed"
                        ),
                    }
                    return Poll::Ready(Some(FanoutEvent::Answer { key, event }));
                }
                Poll::Ready(None) => {}
                Poll::Pending => return Poll::Pending,
            }
        }

        this.terminated = true;
        Poll::Ready(Some(FanoutEvent::Done))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.terminated {
            (0, Some(0))
        } else {
            let n = self.pending.len() + 1;
            (n, Some(n))
        }
    }
}

impl FusedStream for AnswerStream {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

fn normalize(key: &str, result: CallResult) -> AnswerEvent {
    match result {
        CallResult::Finished(Ok(outcome)) => AnswerEvent::from_outcome(key, outcome),
        CallResult::Finished(Err(e)) => AnswerEvent::failure(key, e.to_string()),
        CallResult::TimedOut(after) => {
            AnswerEvent::failure(key, format!("provider timed out after {}s", after.as_secs()))
        }
        CallResult::Panicked(message) => AnswerEvent::failure(key, message),
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "provider task was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => panic_message(payload),
        Err(err) => err.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("provider panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("provider panicked: {}", s)
    } else {
        "provider panicked".to_string()
    }
}
