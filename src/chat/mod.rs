//! Chat transport abstraction layer.
//!
//! This module defines the [`ChatTransport`] trait and the values it moves
//! ([`Message`], [`ChatBatch`], [`ChatError`]).  The HTTP implementation
//! lives in [`http`].
//!
//! ## For contributors — adding a new transport
//!
//! 1. Create a new file in this directory (e.g. `websocket.rs`).
//! 2. Define a struct holding its configuration and implement
//!    [`ChatTransport`] for it.
//! 3. Add `mod websocket;` below and re-export the struct.
//! 4. Construct it in `main.rs` instead of [`HttpTransport`].
//!
//! The polling loop and the UI only ever see the trait.

mod http;
mod message;

pub use http::HttpTransport;
pub use message::{ChatBatch, ChatError, Message, RequestError, FROM_BEGINNING};

use async_trait::async_trait;

/// The two operations a chat server offers.
///
/// Implementations hold only static configuration, so one instance is
/// shared (behind an `Arc`) by every in-flight request.
///
/// ## Implementing a new transport
///
/// ```ignore
/// pub struct MyTransport { /* config fields */ }
///
/// #[async_trait]
/// impl ChatTransport for MyTransport {
///     async fn fetch_since(&self, seq: i64) -> Result<ChatBatch, ChatError> {
///         todo!()
///     }
///
///     async fn post_message(&self, nick: &str, text: &str) -> Result<Message, ChatError> {
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch every message newer than `seq`, plus the server's new cursor.
    ///
    /// Pass [`FROM_BEGINNING`] to get the full history.  An empty batch is a
    /// success.
    async fn fetch_since(&self, seq: i64) -> Result<ChatBatch, ChatError>;

    /// Store a message and return it as the server recorded it.
    ///
    /// `text` must already be trimmed and non-empty.
    async fn post_message(&self, nick: &str, text: &str) -> Result<Message, ChatError>;
}
