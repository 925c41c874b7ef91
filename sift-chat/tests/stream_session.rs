mod common;

use std::time::Duration;

use common::{Ending, dead_address, init_test_tracing, scripted_server};
use futures::StreamExt;
use sift_chat::prompt::SYSTEM_PROMPT;
use sift_chat::{ChatRequest, ChatTransport, StreamError, WsChatClient};
use sift_common::ConversationId;
use tokio_tungstenite::tungstenite::Message;

fn client(addr: std::net::SocketAddr) -> WsChatClient {
    WsChatClient::new(format!("ws://{addr}"), "after-consumer", Duration::from_secs(5))
}

fn request(id: ConversationId, message: &str) -> ChatRequest {
    ChatRequest::new(id, "after-consumer", SYSTEM_PROMPT, message)
}

#[tokio::test]
async fn three_fragments_then_close() {
    init_test_tracing();
    let (addr, _req) = scripted_server(
        vec![
            Message::Text("Rust ".into()),
            Message::Text("is ".into()),
            Message::Text("fast.".into()),
        ],
        Ending::Close,
    )
    .await;

    let items: Vec<_> = client(addr)
        .stream_chat(request(ConversationId::new(), "prompt"))
        .collect()
        .await;

    assert_eq!(
        items,
        vec![Ok("Rust ".to_string()), Ok("is ".to_string()), Ok("fast.".to_string())]
    );
}

#[tokio::test]
async fn sends_one_request_frame_with_wire_schema() {
    init_test_tracing();
    let (addr, captured) = scripted_server(vec![Message::Text("ok".into())], Ending::Close).await;
    let id = ConversationId::new();

    let items: Vec<_> = client(addr)
        .stream_chat(request(id, "Search query: rust"))
        .collect()
        .await;
    assert_eq!(items.len(), 1);

    let raw = captured.await.expect("server saw a request");
    let v: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(v["chatId"], id.to_string());
    assert_eq!(v["appId"], "after-consumer");
    assert_eq!(v["systemPrompt"], SYSTEM_PROMPT);
    assert_eq!(v["message"], "Search query: rust");
}

#[tokio::test]
async fn binary_frames_are_decoded_lossily() {
    let (addr, _req) = scripted_server(
        vec![Message::Binary(vec![b'h', b'i', 0xFF])],
        Ending::Close,
    )
    .await;

    let items: Vec<_> = client(addr)
        .stream_chat(request(ConversationId::new(), "x"))
        .collect()
        .await;
    assert_eq!(items, vec![Ok("hi\u{FFFD}".to_string())]);
}

#[tokio::test]
async fn abrupt_disconnect_keeps_received_fragments() {
    let (addr, _req) = scripted_server(
        vec![Message::Text("a".into()), Message::Text("b".into())],
        Ending::Drop,
    )
    .await;

    let items: Vec<_> = client(addr)
        .stream_chat(request(ConversationId::new(), "x"))
        .collect()
        .await;

    assert_eq!(items[..2], [Ok("a".to_string()), Ok("b".to_string())]);
    assert!(items.len() <= 3);
    if let Some(last) = items.get(2) {
        assert!(matches!(last, Err(StreamError::Receive(_))));
    }
}

#[tokio::test]
async fn unreachable_endpoint_yields_one_error() {
    let addr = dead_address().await;
    let items: Vec<_> = client(addr)
        .stream_chat(request(ConversationId::new(), "x"))
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(StreamError::Connect(_))));
}
