use async_stream::try_stream;
use futures::{SinkExt, Stream, StreamExt};
use serde::Serialize;
use sift_common::{ConversationId, SiftError};
use sift_config::ChatConfig;
use std::pin::Pin;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

/// The single frame sent when a stream session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub chat_id: ConversationId,
    pub app_id: String,
    pub system_prompt: String,
    pub message: String,
}

impl ChatRequest {
    pub fn new(
        chat_id: ConversationId,
        app_id: impl Into<String>,
        system_prompt: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            chat_id,
            app_id: app_id.into(),
            system_prompt: system_prompt.into(),
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),
}

impl From<StreamError> for SiftError {
    fn from(e: StreamError) -> Self {
        SiftError::Stream(e.to_string())
    }
}

/// Reply chunks in arrival order. An `Err` item is always the last one.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// Opens one stream session per request.
pub trait ChatTransport: Send + Sync {
    /// Lazily connect, send `request`, and yield the reply. Nothing happens
    /// until the returned stream is polled.
    fn stream_chat(&self, request: ChatRequest) -> ChunkStream;
}

/// Websocket client for the remote chat service.
#[derive(Debug, Clone)]
pub struct WsChatClient {
    endpoint: String,
    app_id: String,
    connect_timeout: Duration,
}

impl WsChatClient {
    pub fn new(endpoint: impl Into<String>, app_id: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            connect_timeout,
        }
    }

    pub fn from_config(cfg: &ChatConfig) -> Self {
        Self::new(cfg.endpoint.clone(), cfg.app_id.clone(), cfg.connect_timeout())
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl ChatTransport for WsChatClient {
    fn stream_chat(&self, request: ChatRequest) -> ChunkStream {
        Box::pin(session(self.endpoint.clone(), self.connect_timeout, request))
    }
}

fn session(
    endpoint: String,
    bound: Duration,
    request: ChatRequest,
) -> impl Stream<Item = Result<String, StreamError>> + Send {
    try_stream! {
        let (socket, _) = tokio::time::timeout(bound, connect_async(endpoint.as_str()))
            .await
            .map_err(|_| StreamError::Timeout(bound))?
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        info!(target: "chat.stream", %endpoint, chat_id = %request.chat_id, "stream session opened");

        let (mut sink, mut source) = socket.split();
        let payload = serde_json::to_string(&request).map_err(|e| StreamError::Send(e.to_string()))?;
        sink.send(Message::Text(payload))
            .await
            .map_err(|e| StreamError::Send(e.to_string()))?;

        let mut chunks = 0usize;
        while let Some(frame) = source.next().await {
            match frame.map_err(|e| StreamError::Receive(e.to_string()))? {
                Message::Text(text) => {
                    chunks += 1;
                    debug!(target: "chat.stream", len = text.len(), "text frame");
                    yield text;
                }
                Message::Binary(bytes) => {
                    chunks += 1;
                    debug!(target: "chat.stream", len = bytes.len(), "binary frame");
                    yield String::from_utf8_lossy(&bytes).into_owned();
                }
                Message::Close(reason) => {
                    debug!(target: "chat.stream", ?reason, "close frame");
                    break;
                }
                _ => {}
            }
        }
        info!(target: "chat.stream", chunks, "stream session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_wire_field_names() {
        let id = ConversationId::new();
        let req = ChatRequest::new(id, "after-consumer", "sys", "hello");
        let v = serde_json::to_value(&req).unwrap();

        assert_eq!(v["chatId"], serde_json::json!(id.to_string()));
        assert_eq!(v["appId"], "after-consumer");
        assert_eq!(v["systemPrompt"], "sys");
        assert_eq!(v["message"], "hello");
        assert_eq!(v.as_object().unwrap().len(), 4);
    }

    #[test]
    fn stream_errors_map_to_stream_variant() {
        let e: SiftError = StreamError::Receive("reset".into()).into();
        assert!(matches!(e, SiftError::Stream(ref m) if m.contains("reset")));
    }
}
