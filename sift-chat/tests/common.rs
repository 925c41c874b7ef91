#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::OnceLock;

use futures::{SinkExt, StreamExt};
use sift_common::observability::{LogConfig, LogFormat};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "sift-tests",
            emit_stderr: true,
            format: if std::env::var("SIFT_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        sift_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// What the scripted server does after reading the request frame.
pub enum Ending {
    Close,
    Drop,
}

/// Serve one websocket session: capture the first frame, send `replies`,
/// then end as told. Returns the address and the captured request.
pub async fn scripted_server(
    replies: Vec<Message>,
    ending: Ending,
) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake");

        if let Some(Ok(Message::Text(first))) = ws.next().await {
            let _ = tx.send(first);
        }
        for reply in replies {
            ws.send(reply).await.expect("send reply");
        }
        match ending {
            Ending::Close => {
                let _ = ws.close(None).await;
                // Drain until the client acknowledges.
                while let Some(Ok(_)) = ws.next().await {}
            }
            Ending::Drop => drop(ws),
        }
    });

    (addr, rx)
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}
