//! HTTP chat transport.
//!
//! Speaks JSON to a single `/chat` endpoint:
//!
//! * `GET  /chat?since=<seq>` returns a [`ChatBatch`].
//! * `POST /chat` with a [`Message`] body returns the stored [`Message`].
//!
//! Any non-success status whose body decodes as a [`RequestError`] is an
//! application failure; everything else that goes wrong is a transport
//! failure.  Decoding is done by [`decode_reply`], a pure function of status
//! and body, so it can be tested without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ChatBatch, ChatError, ChatTransport, Message, RequestError};

const CHAT_PATH: &str = "chat";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A chat server reached over HTTP.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport for the server rooted at `base_url`
    /// (e.g. `http://localhost:8080/`).
    pub fn new(base_url: &Url) -> Result<Self, ChatError> {
        let endpoint = base_url
            .join(CHAT_PATH)
            .map_err(|e| ChatError::Transport(format!("invalid server address: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    /// The `/chat` URL both operations talk to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read_reply<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ChatError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        decode_reply(status, &body)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn fetch_since(&self, seq: i64) -> Result<ChatBatch, ChatError> {
        debug!(seq, "GET {}", self.endpoint);
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("since", seq)])
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, "fetch failed");
                ChatError::Transport(e.to_string())
            })?;
        Self::read_reply(response).await
    }

    async fn post_message(&self, nick: &str, text: &str) -> Result<Message, ChatError> {
        debug!(nick, "POST {}", self.endpoint);
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&Message::new(nick, text))
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, "post failed");
                ChatError::Transport(e.to_string())
            })?;
        Self::read_reply(response).await
    }
}

/// Turn a status code and body into the expected value or a [`ChatError`].
pub(crate) fn decode_reply<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, ChatError> {
    if status.is_success() {
        return serde_json::from_str(body)
            .map_err(|e| ChatError::Transport(format!("malformed response: {e}")));
    }
    match serde_json::from_str::<RequestError>(body) {
        Ok(error) => Err(ChatError::Application(error)),
        Err(_) => Err(ChatError::Transport(format!("unexpected status {status}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    // -- decode_reply --------------------------------------------------------

    #[test]
    fn decodes_batch_on_success() {
        let batch: ChatBatch = decode_reply(
            StatusCode::OK,
            r#"{"messages":[{"nick":"alice","message":"hi"}],"last_seq":1}"#,
        )
        .unwrap();
        assert_eq!(batch.messages, vec![Message::new("alice", "hi")]);
        assert_eq!(batch.last_seq, 1);
    }

    #[test]
    fn garbled_success_body_is_transport_error() {
        let err = decode_reply::<ChatBatch>(StatusCode::OK, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }

    #[test]
    fn error_body_is_application_error() {
        let err =
            decode_reply::<Message>(StatusCode::BAD_REQUEST, r#"{"message":"nick is required"}"#)
                .unwrap_err();
        match err {
            ChatError::Application(e) => assert_eq!(e.message, "nick is required"),
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn error_status_without_body_is_transport_error() {
        let err = decode_reply::<Message>(StatusCode::BAD_GATEWAY, "").unwrap_err();
        match err {
            ChatError::Transport(reason) => assert!(reason.contains("502")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_is_chat_under_base() {
        let base = Url::parse("http://example.com:9000/").unwrap();
        let transport = HttpTransport::new(&base).unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://example.com:9000/chat");
    }

    // -- against a live in-process server ------------------------------------

    async fn history(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let since: i64 = params
            .get("since")
            .and_then(|s| s.parse().ok())
            .unwrap_or(-1);
        let all = [("alice", "hi"), ("bob", "yo"), ("carol", "hey")];
        let messages: Vec<Value> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| *i as i64 > since)
            .map(|(_, (nick, text))| json!({"nick": nick, "message": text}))
            .collect();
        Json(json!({"messages": messages, "last_seq": all.len() as i64 - 1}))
    }

    async fn store(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
        let nick = body["nick"].as_str().unwrap_or_default().trim().to_lowercase();
        if nick.is_empty() {
            return (
                AxumStatus::BAD_REQUEST,
                Json(json!({"message": "nick is required"})),
            );
        }
        (
            AxumStatus::OK,
            Json(json!({"nick": nick, "message": body["message"]})),
        )
    }

    async fn spawn_server() -> Url {
        let app = Router::new().route("/chat", get(history).post(store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[tokio::test]
    async fn fetch_since_beginning_returns_history() {
        let transport = HttpTransport::new(&spawn_server().await).unwrap();
        let batch = transport.fetch_since(crate::chat::FROM_BEGINNING).await.unwrap();
        assert_eq!(batch.messages.len(), 3);
        assert_eq!(batch.messages[0], Message::new("alice", "hi"));
        assert_eq!(batch.last_seq, 2);
    }

    #[tokio::test]
    async fn fetch_since_cursor_returns_only_newer() {
        let transport = HttpTransport::new(&spawn_server().await).unwrap();
        let batch = transport.fetch_since(1).await.unwrap();
        assert_eq!(batch.messages, vec![Message::new("carol", "hey")]);
    }

    #[tokio::test]
    async fn fetch_with_nothing_new_is_empty_success() {
        let transport = HttpTransport::new(&spawn_server().await).unwrap();
        let batch = transport.fetch_since(2).await.unwrap();
        assert!(batch.messages.is_empty());
        assert_eq!(batch.last_seq, 2);
    }

    #[tokio::test]
    async fn post_returns_server_normalised_message() {
        let transport = HttpTransport::new(&spawn_server().await).unwrap();
        let stored = transport.post_message("Bob", "hello").await.unwrap();
        assert_eq!(stored, Message::new("bob", "hello"));
    }

    #[tokio::test]
    async fn post_rejected_by_server_is_application_error() {
        let transport = HttpTransport::new(&spawn_server().await).unwrap();
        let err = transport.post_message("  ", "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Application(e) if e.message == "nick is required"));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let transport = HttpTransport::new(&base).unwrap();
        let err = transport.fetch_since(-1).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
