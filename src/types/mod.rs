//! 类型系统模块：定义问答扇出服务的核心数据类型。
//!
//! # Types Module
//!
//! This module defines the data that flows through a single quiz request: the
//! inbound [`QuizRequest`], the per-provider [`ProviderOutcome`], and the
//! normalized [`AnswerEvent`] that is written to the client.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QuizRequest`] | Inbound `{subject, question}` body |
//! | [`ProviderOutcome`] | Raw result of one provider call |
//! | [`AnswerEvent`] | Normalized unit streamed to the client |
//! | [`FanoutEvent`] | A provider event or the terminal marker |
//!
//! ## Example
//!
//! ```rust
//! use quiz_fanout::types::{AnswerEvent, ProviderOutcome};
//!
//! let event = AnswerEvent::from_outcome("openai", ProviderOutcome::Success("C) Redis".into()));
//! assert_eq!(event.provider, "openai");
//! assert!(event.error.is_none());
//! ```

pub mod events;
pub mod request;

pub use events::{AnswerEvent, FanoutEvent, ProviderOutcome, DONE_EVENT};
pub use request::QuizRequest;
