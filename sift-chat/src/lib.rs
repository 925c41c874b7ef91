//! Remote chat integration for Sift.
//!
//! [`prompt`] turns scraped documents into the text payload; [`client`]
//! streams the reply from the chat service as an ordered sequence of chunks.
//!
//! # Examples
//! ```no_run
//! use futures::StreamExt;
//! use sift_chat::client::{ChatRequest, ChatTransport, WsChatClient};
//! use sift_chat::prompt::SYSTEM_PROMPT;
//! use sift_common::ConversationId;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = WsChatClient::from_config(&sift_config::ChatConfig::default());
//! let request = ChatRequest::new(ConversationId::new(), "after-consumer", SYSTEM_PROMPT, "hello");
//! let mut chunks = client.stream_chat(request);
//! while let Some(chunk) = chunks.next().await {
//!     match chunk {
//!         Ok(text) => print!("{text}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! # }
//! ```
pub mod client;
pub mod prompt;

pub use client::{ChatRequest, ChatTransport, ChunkStream, StreamError, WsChatClient};
