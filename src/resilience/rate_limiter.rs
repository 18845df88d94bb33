use crate::{Error, ErrorContext, Result};
use std::collections::{HashMap, VecDeque};
use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Identity used when neither a forwarded-for header nor a peer address is known.
pub const UNKNOWN_IDENTITY: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterSnapshot {
    pub max_requests: usize,
    pub window_ms: u64,
    /// Admitted requests still inside the trailing window.
    pub in_window: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowConfig {
    /// Maximum admitted requests per identity inside one window.
    pub max_requests: usize,
    /// Trailing window length.
    pub window: Duration,
}

impl SlidingWindowConfig {
    /// Create a new config with default values (9 requests per 60 seconds)
    pub fn new() -> Self {
        Self {
            max_requests: 9,
            window: Duration::from_secs(60),
        }
    }

    /// Defaults, overridable via env:
    /// - `QUIZ_RATE_LIMIT_MAX_REQUESTS`
    /// - `QUIZ_RATE_LIMIT_WINDOW_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::new();
        let max_requests = env::var("QUIZ_RATE_LIMIT_MAX_REQUESTS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_requests);
        let window_secs = env::var("QUIZ_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.window.as_secs());
        Self {
            max_requests,
            window: Duration::from_secs(window_secs.max(1)),
        }
    }

    pub fn with_max_requests(mut self, n: usize) -> Self {
        self.max_requests = n;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request recorded; `remaining` further requests fit in the current window.
    Accepted { remaining: usize },
    /// Request not recorded; a slot frees up after `retry_after`.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted { .. })
    }
}

/// Per-client sliding-log rate limiter.
///
/// - Every identity keeps the timestamps of its admitted requests
/// - Timestamps older than the window are trimmed from the front before counting
/// - One lock covers all identities, so no two checks ever interleave
pub struct SlidingWindowLimiter {
    cfg: SlidingWindowConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(cfg: SlidingWindowConfig) -> Self {
        Self {
            cfg,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SlidingWindowConfig {
        &self.cfg
    }

    /// Admission check against the system clock.
    pub fn admit(&self, identity: &str) -> Result<Admission> {
        self.admit_at(identity, Instant::now())
    }

    /// Admission check at an explicit instant. Callers must not pass instants
    /// earlier than ones already admitted for the same identity.
    pub fn admit_at(&self, identity: &str, now: Instant) -> Result<Admission> {
        let mut windows = self.lock()?;
        let log = windows.entry(identity.to_string()).or_default();

        Self::evict_expired(&self.cfg, log, now);

        if log.len() >= self.cfg.max_requests {
            let retry_after = log
                .front()
                .map(|oldest| (*oldest + self.cfg.window).saturating_duration_since(now))
                .unwrap_or(self.cfg.window);
            return Ok(Admission::Rejected { retry_after });
        }

        log.push_back(now);
        Ok(Admission::Accepted {
            remaining: self.cfg.max_requests - log.len(),
        })
    }

    /// Read-only view of one identity's window as of `now`.
    pub fn snapshot_at(&self, identity: &str, now: Instant) -> Result<RateLimiterSnapshot> {
        let windows = self.lock()?;
        let in_window = windows
            .get(identity)
            .map(|log| {
                log.iter()
                    .filter(|ts| now.saturating_duration_since(**ts) <= self.cfg.window)
                    .count()
            })
            .unwrap_or(0);

        Ok(RateLimiterSnapshot {
            max_requests: self.cfg.max_requests,
            window_ms: self.cfg.window.as_millis() as u64,
            in_window,
        })
    }

    /// Number of identities that have ever been seen.
    pub fn tracked_identities(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn evict_expired(cfg: &SlidingWindowConfig, log: &mut VecDeque<Instant>, now: Instant) {
        // Strictly older than `now - window`; a timestamp exactly on the boundary stays.
        while let Some(oldest) = log.front() {
            if now.saturating_duration_since(*oldest) > cfg.window {
                log.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, VecDeque<Instant>>>> {
        self.windows.lock().map_err(|_| {
            Error::runtime_with_context(
                "SlidingWindowLimiter poisoned",
                ErrorContext::new().with_source("rate_limiter"),
            )
        })
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(SlidingWindowConfig::default())
    }
}
