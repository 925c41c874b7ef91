//! Common types and utilities shared across Sift crates.
//!
//! This crate holds the domain vocabulary every other crate speaks: the
//! conversation identifier sent to the chat service, the scraped
//! [`SourceDocument`], the shared [`SiftError`], and the observability
//! helpers. It stays dependency-light so all crates can depend on it.
//!
//! # Overview
//!
//! - [`ConversationId`]: stable per-process chat identifier
//! - [`SourceDocument`]: one fetched page (url, title, capped content)
//! - [`truncate_chars`]: code-point safe truncation used for every cap
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`SiftError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use sift_common::SourceDocument;
//!
//! let doc = SourceDocument::new("https://example.com", None, "hello world", 5);
//! assert_eq!(doc.title(), "No title");
//! assert_eq!(doc.content(), "hello");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod observability;

/// Title used when a page has no `<title>` or an empty one.
pub const UNTITLED: &str = "No title";

/// Identifier for every request made to the remote chat service during one
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// A page that was fetched and reduced to plain text.
///
/// The content is truncated on construction, so a document can never carry
/// more than the cap it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    url: String,
    title: String,
    content: String,
}

impl SourceDocument {
    /// Build a document, defaulting a missing or blank title to
    /// [`UNTITLED`] and truncating `content` to `cap` characters.
    pub fn new(
        url: impl Into<String>,
        title: Option<String>,
        content: impl AsRef<str>,
        cap: usize,
    ) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        Self {
            url: url.into(),
            title,
            content: truncate_chars(content.as_ref(), cap).to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Return at most `max` characters of `s`, never splitting a code point.
///
/// ```
/// assert_eq!(sift_common::truncate_chars("héllo", 2), "hé");
/// assert_eq!(sift_common::truncate_chars("abc", 10), "abc");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Error types used across the Sift system.
#[derive(thiserror::Error, Debug)]
pub enum SiftError {
    /// The browser automation layer failed (session, navigation, DOM access).
    #[error("Browser error: {0}")]
    Browser(String),

    /// The search engine page could not be loaded or read.
    #[error("Search error: {0}")]
    Search(String),

    /// A single result page could not be fetched or parsed.
    #[error("Fetch error for {url}: {detail}")]
    Fetch { url: String, detail: String },

    /// The chat transport failed.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`SiftError`].
pub type Result<T> = std::result::Result<T, SiftError>;
