/// Banner shown after a search answer streams to completion.
pub const SEARCH_BANNER: &str =
    "💡 You can ask follow-up questions below for more detailed information.";

/// Banner shown after a follow-up answer streams to completion.
pub const FOLLOWUP_BANNER: &str = "✔ Answer complete.";

/// Shown when a search produced no usable documents.
pub const NO_SOURCES: &str = "❌ No sources could be retrieved for this query.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub busy: bool,
    /// Documents retained for follow-up questions.
    pub documents: usize,
}

/// Everything the research session appends to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Status(String),
    Error(String),
    /// One streamed reply fragment, appended as-is.
    Chunk(String),
    Banner(String),
    Session(SessionSnapshot),
}

/// Append-only sink for session output. Order of delivery is the order of
/// `emit` calls.
#[async_trait::async_trait]
pub trait Surface: Send + Sync + 'static {
    async fn emit(&self, out: Output);
}
