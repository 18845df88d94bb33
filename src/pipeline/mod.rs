//! 扇出模块：并发调用所有 provider，并按完成顺序输出结果。
//!
//! # Fan-out Layer
//!
//! ```text
//!                ┌─▶ gemini task ─┐
//! question ──────┤                ├──▶ AnswerStream ──▶ event, event, done
//!                └─▶ openai task ─┘   (completion order)
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FanoutStreamer`] | Shared dispatcher holding the registered providers |
//! | [`AnswerStream`] | Per-request stream of [`FanoutEvent`](crate::types::FanoutEvent)s |
//! | [`FanoutState`] | Observable progress of an `AnswerStream` |

pub mod fan_out;

pub use fan_out::{AnswerStream, FanoutState, FanoutStreamer};
