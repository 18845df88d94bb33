//! 限流模块：按客户端身份的滑动窗口准入控制。
//!
//! # Admission Control
//!
//! Protects the upstream providers from a single noisy client. Each client
//! identity keeps a log of admitted request times; a request is admitted only
//! while fewer than `max_requests` entries remain inside the trailing window.
//!
//! ```rust
//! use quiz_fanout::resilience::{Admission, SlidingWindowConfig, SlidingWindowLimiter};
//! use std::time::{Duration, Instant};
//!
//! let limiter = SlidingWindowLimiter::new(
//!     SlidingWindowConfig::new()
//!         .with_max_requests(2)
//!         .with_window(Duration::from_secs(60)),
//! );
//! let now = Instant::now();
//! assert!(limiter.admit_at("203.0.113.7", now).unwrap().is_accepted());
//! assert!(limiter.admit_at("203.0.113.7", now).unwrap().is_accepted());
//! assert!(matches!(
//!     limiter.admit_at("203.0.113.7", now).unwrap(),
//!     Admission::Rejected { .. }
//! ));
//! ```

pub mod rate_limiter;

pub use rate_limiter::{
    Admission, RateLimiterSnapshot, SlidingWindowConfig, SlidingWindowLimiter, UNKNOWN_IDENTITY,
};
