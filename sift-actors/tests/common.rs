#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use sift_actors::actor::{spawn_actor, ActorHandle, Addr};
use sift_actors::{Output, Pipeline, ResearchActor, Surface};
use sift_chat::{ChatRequest, ChatTransport, ChunkStream, StreamError};
use sift_common::observability::{LogConfig, LogFormat};
use sift_common::{SiftError, SourceDocument};
use sift_web::{Collection, DocumentCollector, FetchFailure};
use tokio::sync::{mpsc, Notify};

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

pub fn doc(url: &str, content: &str) -> SourceDocument {
    SourceDocument::new(url, None, content, 4500)
}

pub fn docs(urls: &[&str]) -> Vec<SourceDocument> {
    urls.iter().map(|u| doc(u, &format!("content of {u}"))).collect()
}

/// Hands out scripted collections in order; repeats the last one.
pub struct ScriptedCollector {
    script: Mutex<VecDeque<Result<Collection, String>>>,
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedCollector {
    pub fn new(script: Vec<Result<Collection, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn found(documents: Vec<SourceDocument>) -> Result<Collection, String> {
    Ok(Collection {
        documents,
        failures: Vec::new(),
    })
}

pub fn all_failed(urls: &[&str]) -> Result<Collection, String> {
    Ok(Collection {
        documents: Vec::new(),
        failures: urls
            .iter()
            .map(|u| FetchFailure::new(*u, "page load timed out"))
            .collect(),
    })
}

#[async_trait::async_trait]
impl DocumentCollector for ScriptedCollector {
    async fn collect(&self, query: &str, max_sources: usize) -> sift_common::Result<Collection> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_sources));
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match next {
            Some(Ok(c)) => Ok(c),
            Some(Err(detail)) => Err(SiftError::Search(detail)),
            None => Ok(Collection::default()),
        }
    }
}

/// Replies with fixed fragments; optionally holds the stream open until
/// released.
pub struct ScriptedChat {
    reply: Vec<Result<String, StreamError>>,
    gate: Option<Arc<Notify>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    opened: AtomicUsize,
}

impl ScriptedChat {
    pub fn new(reply: Vec<Result<String, StreamError>>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            gate: None,
            requests: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
        })
    }

    pub fn gated(reply: Vec<Result<String, StreamError>>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            gate: Some(gate),
            requests: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
        })
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl ChatTransport for ScriptedChat {
    fn stream_chat(&self, request: ChatRequest) -> ChunkStream {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let reply = self.reply.clone();
        let gate = self.gate.clone();
        Box::pin(async_stream::stream! {
            for item in reply {
                yield item;
            }
            if let Some(gate) = gate {
                gate.notified().await;
            }
        })
    }
}

/// Forwards every output to the test.
pub struct ChannelSurface(pub mpsc::UnboundedSender<Output>);

#[async_trait::async_trait]
impl Surface for ChannelSurface {
    async fn emit(&self, out: Output) {
        let _ = self.0.send(out);
    }
}

pub struct Harness {
    pub addr: Addr<ResearchActor>,
    pub outputs: mpsc::UnboundedReceiver<Output>,
    pub handle: ActorHandle<ResearchActor>,
}

pub fn start(collector: Arc<ScriptedCollector>, chat: Arc<ScriptedChat>) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = Pipeline {
        collector,
        chat,
        surface: Arc::new(ChannelSurface(tx)),
        app_id: "after-consumer".into(),
        followup_cap: 1000,
    };
    let handle = spawn_actor(ResearchActor::new(pipeline), 64);
    Harness {
        addr: handle.addr.clone(),
        outputs: rx,
        handle,
    }
}

/// Collect outputs until the session reports idle again.
pub async fn until_idle(rx: &mut mpsc::UnboundedReceiver<Output>) -> Vec<Output> {
    let mut seen = Vec::new();
    let deadline = Duration::from_secs(5);
    loop {
        let next = tokio::time::timeout(deadline, rx.recv())
            .await
            .expect("session did not go idle in time")
            .expect("surface channel closed");
        let idle = matches!(next, Output::Session(s) if !s.busy);
        seen.push(next);
        if idle {
            return seen;
        }
    }
}

/// Collect outputs until `pred` matches one.
pub async fn until(
    rx: &mut mpsc::UnboundedReceiver<Output>,
    pred: impl Fn(&Output) -> bool,
) -> Vec<Output> {
    let mut seen = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("expected output did not arrive")
            .expect("surface channel closed");
        let hit = pred(&next);
        seen.push(next);
        if hit {
            return seen;
        }
    }
}
