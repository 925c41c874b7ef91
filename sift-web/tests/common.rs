#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use sift_common::observability::{LogConfig, LogFormat};
use sift_web::PageSource;

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

/// One scripted page: how long it takes and what it yields.
#[derive(Clone)]
pub struct Scripted {
    pub delay: Duration,
    pub html: Result<String, String>,
}

impl Scripted {
    pub fn page(delay_ms: u64, title: &str, body: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            html: Ok(format!("<html><head><title>{title}</title></head><body><p>{body}</p></body></html>")),
        }
    }

    pub fn failing(delay_ms: u64, detail: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            html: Err(detail.to_string()),
        }
    }
}

/// In-memory web: a fixed result page plus scripted documents.
pub struct FakeWeb {
    pub results: Result<Vec<String>, String>,
    pub pages: HashMap<String, Scripted>,
    pub renders: AtomicUsize,
    pub searches: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl FakeWeb {
    pub fn new(results: Vec<&str>, pages: Vec<(&str, Scripted)>) -> Self {
        Self {
            results: Ok(results.into_iter().map(String::from).collect()),
            pages: pages.into_iter().map(|(u, p)| (u.to_string(), p)).collect(),
            renders: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn broken_search(detail: &str) -> Self {
        let mut web = Self::new(Vec::new(), Vec::new());
        web.results = Err(detail.to_string());
        web
    }
}

#[async_trait::async_trait]
impl PageSource for FakeWeb {
    async fn render(&self, url: &str, _settle: Duration) -> anyhow::Result<String> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let scripted = self.pages.get(url).cloned();
        let out = match scripted {
            Some(s) => {
                tokio::time::sleep(s.delay).await;
                s.html.map_err(|e| anyhow!(e))
            }
            None => Err(anyhow!("no route to {url}")),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }

    async fn links(&self, _url: &str, _selector: &str, _bound: Duration) -> anyhow::Result<Vec<String>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.results.clone().map_err(|e| anyhow!(e))
    }
}
