//! Values exchanged with the chat server.
//!
//! Every type here is a plain serde value: the HTTP transport decodes server
//! replies straight into them, and the polling loop hands them to the display
//! sink without further conversion.
//!
//! ## Wire shape
//!
//! ```text
//! Message      {"nick": "alice", "message": "hi"}
//! ChatBatch    {"messages": [Message, ...], "last_seq": 7}
//! RequestError {"message": "nick is required"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Cursor value that asks the server for the whole history.
pub const FROM_BEGINNING: i64 = -1;

/// A single chat line.
///
/// Messages carry no identity of their own; their position in the server's
/// log is the only ordering there is.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub nick: String,
    #[serde(rename = "message")]
    pub text: String,
}

impl Message {
    pub fn new(nick: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            text: text.into(),
        }
    }
}

/// Result of one fetch: everything newer than the requested cursor.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct ChatBatch {
    #[serde(default)]
    pub messages: Vec<Message>,
    /// The newest sequence number the server has assigned.
    pub last_seq: i64,
}

/// A failure reported by the server in a structured error body.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct RequestError {
    pub message: String,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Either way a chat request can fail.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No usable response: connection refused, timeout, garbled body.
    #[error("network error: {0}")]
    Transport(String),
    /// The server answered with an error body.
    #[error("server error: {0}")]
    Application(RequestError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_uses_message_as_wire_field() {
        let json = serde_json::to_value(Message::new("bob", "hello")).unwrap();
        assert_eq!(json, serde_json::json!({"nick": "bob", "message": "hello"}));
    }

    #[test]
    fn batch_without_messages_field_is_empty() {
        let batch: ChatBatch = serde_json::from_str(r#"{"last_seq": 4}"#).unwrap();
        assert!(batch.messages.is_empty());
        assert_eq!(batch.last_seq, 4);
    }

    #[test]
    fn batch_keeps_server_order() {
        let batch: ChatBatch = serde_json::from_str(
            r#"{"messages":[{"nick":"a","message":"1"},{"nick":"b","message":"2"}],"last_seq":2}"#,
        )
        .unwrap();
        assert_eq!(
            batch.messages,
            vec![Message::new("a", "1"), Message::new("b", "2")]
        );
    }

    #[test]
    fn chat_error_display() {
        let err = ChatError::Application(RequestError {
            message: "nick taken".into(),
        });
        assert_eq!(err.to_string(), "server error: nick taken");
        assert_eq!(
            ChatError::Transport("timed out".into()).to_string(),
            "network error: timed out"
        );
    }
}
