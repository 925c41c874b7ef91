use crate::actor::{Actor, Addr, Context};
use crate::surface::{Output, SessionSnapshot, Surface, FOLLOWUP_BANNER, NO_SOURCES, SEARCH_BANNER};
use anyhow::Result;
use futures::StreamExt;
use sift_chat::prompt::{build_followup_prompt, build_search_prompt, SYSTEM_PROMPT};
use sift_chat::{ChatRequest, ChatTransport};
use sift_common::{ConversationId, SiftError, SourceDocument};
use sift_config::clamp_sources;
use sift_web::DocumentCollector;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub enum ResearchMsg {
    /// Search, fetch the top results, and stream an analysis.
    Search { query: String, max_sources: usize },
    /// Ask about the documents kept from the last successful search.
    FollowUp { question: String },
    /// Re-emit the current [`SessionSnapshot`].
    Refresh,
    /// A search produced documents; they replace the retained set.
    Collected(Vec<SourceDocument>),
    /// The in-flight request ended, successfully or not.
    Finished,
}

/// Collaborators shared by every request task.
#[derive(Clone)]
pub struct Pipeline {
    pub collector: Arc<dyn DocumentCollector>,
    pub chat: Arc<dyn ChatTransport>,
    pub surface: Arc<dyn Surface>,
    pub app_id: String,
    pub followup_cap: usize,
}

/// Owner of the session state. The busy flag is checked and set only inside
/// `handle`, so two requests can never both start.
pub struct ResearchActor {
    conversation_id: ConversationId,
    latest_documents: Arc<[SourceDocument]>,
    busy: bool,
    pipeline: Pipeline,
}

impl ResearchActor {
    pub fn new(pipeline: Pipeline) -> Self {
        Self::with_conversation(ConversationId::new(), pipeline)
    }

    pub fn with_conversation(conversation_id: ConversationId, pipeline: Pipeline) -> Self {
        Self {
            conversation_id,
            latest_documents: Arc::from(Vec::new()),
            busy: false,
            pipeline,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            busy: self.busy,
            documents: self.latest_documents.len(),
        }
    }

    async fn publish(&self) {
        self.pipeline
            .surface
            .emit(Output::Session(self.snapshot()))
            .await;
    }

    /// Run `work` in the background and report `Finished` exactly once,
    /// even if the work panics.
    fn launch<F>(&self, me: Addr<ResearchActor>, work: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let surface = self.pipeline.surface.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::spawn(work).await {
                error!(target: "session", error = %e, "request task failed");
                surface
                    .emit(Output::Error(format!("❌ Internal error: {e}")))
                    .await;
            }
            let _ = me.send(ResearchMsg::Finished).await;
        });
    }
}

#[async_trait::async_trait]
impl Actor for ResearchActor {
    type Msg = ResearchMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            ResearchMsg::Search { query, max_sources } => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    return Ok(());
                }
                if self.busy {
                    debug!(target: "session", %query, "search ignored while busy");
                    return Ok(());
                }
                self.busy = true;
                self.publish().await;

                let n = clamp_sources(max_sources);
                info!(target: "session", %query, sources = n, "search started");
                let task = RequestTask {
                    pipeline: self.pipeline.clone(),
                    conversation_id: self.conversation_id,
                    me: ctx.addr(),
                };
                self.launch(ctx.addr(), task.search(query, n));
            }
            ResearchMsg::FollowUp { question } => {
                let question = question.trim().to_string();
                if question.is_empty() {
                    return Ok(());
                }
                if self.busy {
                    debug!(target: "session", "follow-up ignored while busy");
                    return Ok(());
                }
                if self.latest_documents.is_empty() {
                    debug!(target: "session", "follow-up ignored without retained documents");
                    return Ok(());
                }
                self.busy = true;
                self.publish().await;

                info!(target: "session", documents = self.latest_documents.len(), "follow-up started");
                let task = RequestTask {
                    pipeline: self.pipeline.clone(),
                    conversation_id: self.conversation_id,
                    me: ctx.addr(),
                };
                self.launch(ctx.addr(), task.follow_up(question, self.latest_documents.clone()));
            }
            ResearchMsg::Refresh => self.publish().await,
            ResearchMsg::Collected(documents) => {
                // Only a non-empty collection replaces what was retained.
                if !documents.is_empty() {
                    self.latest_documents = Arc::from(documents);
                    self.publish().await;
                }
            }
            ResearchMsg::Finished => {
                self.busy = false;
                info!(target: "session", "request finished");
                self.publish().await;
            }
        }
        Ok(())
    }

    async fn stopped(&mut self) {
        debug!(target: "session", conversation = %self.conversation_id, "session closed");
    }
}

/// One accepted request, running outside the actor.
struct RequestTask {
    pipeline: Pipeline,
    conversation_id: ConversationId,
    me: Addr<ResearchActor>,
}

impl RequestTask {
    async fn emit(&self, out: Output) {
        self.pipeline.surface.emit(out).await;
    }

    async fn search(self, query: String, sources: usize) {
        self.emit(Output::Status(format!(
            "🔍 Searching for: {query}\nAnalyzing {sources} sources..."
        )))
        .await;

        let collection = match self.pipeline.collector.collect(&query, sources).await {
            Ok(c) => c,
            Err(e) => {
                warn!(target: "session", error = %e, "search failed");
                self.emit(Output::Error(format!("❌ Error during search: {}", search_detail(e))))
                    .await;
                return;
            }
        };

        for failure in &collection.failures {
            self.emit(Output::Error(format!(
                "❌ Error extracting content from {}: {}",
                failure.url, failure.detail
            )))
            .await;
        }
        if collection.is_empty() {
            self.emit(Output::Error(NO_SOURCES.to_string())).await;
            return;
        }

        let prompt = build_search_prompt(&query, &collection.documents);
        let _ = self
            .me
            .send(ResearchMsg::Collected(collection.documents))
            .await;

        self.emit(Output::Status("🤖 Analyzing multiple sources...".into()))
            .await;
        if self.stream_reply(prompt).await {
            self.emit(Output::Banner(SEARCH_BANNER.into())).await;
        }
    }

    async fn follow_up(self, question: String, documents: Arc<[SourceDocument]>) {
        self.emit(Output::Status(format!("👤 Follow-up: {question}")))
            .await;
        let prompt = build_followup_prompt(&question, &documents, self.pipeline.followup_cap);
        if self.stream_reply(prompt).await {
            self.emit(Output::Banner(FOLLOWUP_BANNER.into())).await;
        }
    }

    /// Forward every chunk to the surface. Returns `true` when the stream
    /// ended without a transport error.
    async fn stream_reply(&self, prompt: String) -> bool {
        let request = ChatRequest::new(
            self.conversation_id,
            self.pipeline.app_id.clone(),
            SYSTEM_PROMPT,
            prompt,
        );
        let mut chunks = self.pipeline.chat.stream_chat(request);
        while let Some(item) = chunks.next().await {
            match item {
                Ok(text) => self.emit(Output::Chunk(text)).await,
                Err(e) => {
                    warn!(target: "session", error = %e, "chat stream failed");
                    self.emit(Output::Error(format!("❌ WebSocket error: {e}")))
                        .await;
                    return false;
                }
            }
        }
        true
    }
}

fn search_detail(e: SiftError) -> String {
    match e {
        SiftError::Search(detail) => detail,
        other => other.to_string(),
    }
}
