use crate::browser::PageSource;
use crate::extract::extract_page;
use sift_common::{SiftError, SourceDocument};
use sift_config::FetchConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A page that could not be turned into a [`SourceDocument`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{url}: {detail}")]
pub struct FetchFailure {
    pub url: String,
    pub detail: String,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            detail: detail.into(),
        }
    }
}

impl From<FetchFailure> for SiftError {
    fn from(f: FetchFailure) -> Self {
        SiftError::Fetch {
            url: f.url,
            detail: f.detail,
        }
    }
}

/// Loads one page and reduces it to a capped plain-text document.
pub struct PageFetcher {
    source: Arc<dyn PageSource>,
    settle: Duration,
    cap: usize,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn PageSource>, settle: Duration, cap: usize) -> Self {
        Self { source, settle, cap }
    }

    pub fn from_config(source: Arc<dyn PageSource>, cfg: &FetchConfig) -> Self {
        Self::new(source, cfg.settle_delay(), cfg.content_cap)
    }

    #[instrument(target = "web.fetch", skip(self), fields(cap = self.cap))]
    pub async fn fetch(&self, url: &str) -> Result<SourceDocument, FetchFailure> {
        if url.trim().is_empty() {
            return Err(FetchFailure::new(url, "empty URL"));
        }

        let html = self
            .source
            .render(url, self.settle)
            .await
            .map_err(|e| FetchFailure::new(url, format!("{e:#}")))?;

        let page = extract_page(&html);
        debug!(target: "web.fetch", chars = page.text.chars().count(), "extracted page text");
        Ok(SourceDocument::new(url, page.title, page.text, self.cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct StaticPage(Result<&'static str, &'static str>);

    #[async_trait::async_trait]
    impl PageSource for StaticPage {
        async fn render(&self, _url: &str, _settle: Duration) -> anyhow::Result<String> {
            self.0.map(str::to_string).map_err(|e| anyhow!(e))
        }

        async fn links(&self, _: &str, _: &str, _: Duration) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn fetcher(page: Result<&'static str, &'static str>, cap: usize) -> PageFetcher {
        PageFetcher::new(Arc::new(StaticPage(page)), Duration::ZERO, cap)
    }

    #[tokio::test]
    async fn builds_capped_document() {
        let f = fetcher(Ok("<title>T</title><p>abcdefghij</p>"), 4);
        let doc = f.fetch("https://a.test/").await.unwrap();
        assert_eq!(doc.url(), "https://a.test/");
        assert_eq!(doc.title(), "T");
        assert_eq!(doc.content(), "abcd");
    }

    #[tokio::test]
    async fn untitled_page_gets_sentinel() {
        let doc = fetcher(Ok("<p>body</p>"), 100).fetch("https://a.test/").await.unwrap();
        assert_eq!(doc.title(), sift_common::UNTITLED);
    }

    #[tokio::test]
    async fn empty_page_is_still_a_document() {
        let doc = fetcher(Ok(""), 100).fetch("https://a.test/").await.unwrap();
        assert_eq!(doc.content(), "");
    }

    #[tokio::test]
    async fn render_error_names_the_url() {
        let err = fetcher(Err("net::ERR_NAME_NOT_RESOLVED"), 100)
            .fetch("https://gone.test/")
            .await
            .unwrap_err();
        assert_eq!(err.url, "https://gone.test/");
        assert!(err.detail.contains("ERR_NAME_NOT_RESOLVED"));
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_loading() {
        let err = fetcher(Ok("<p>x</p>"), 100).fetch("  ").await.unwrap_err();
        assert_eq!(err.detail, "empty URL");
    }
}
