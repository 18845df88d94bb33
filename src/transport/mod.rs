//! 传输层：共享的 HTTP 客户端与错误类型。
//!
//! Thin wrapper over `reqwest` shared by every provider client.

pub mod http;

pub use http::{HttpTransport, TransportError, TransportResponse};
