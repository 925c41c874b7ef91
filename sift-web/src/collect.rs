use crate::browser::PageSource;
use crate::fetch::{FetchFailure, PageFetcher};
use crate::search::{SearchEngine, SerpSearch};
use sift_common::SourceDocument;
use sift_config::{SiftConfig, clamp_sources};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

/// Everything one search produced.
#[derive(Debug, Default, Clone)]
pub struct Collection {
    /// Successfully fetched pages, in search rank order.
    pub documents: Vec<SourceDocument>,
    /// Pages that could not be fetched, in search rank order.
    pub failures: Vec<FetchFailure>,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Seam between the research session and web acquisition.
#[async_trait::async_trait]
pub trait DocumentCollector: Send + Sync {
    /// Search for `query` and fetch up to `max_sources` result pages.
    ///
    /// A failed result page only lands in [`Collection::failures`]; an `Err`
    /// means the search itself failed.
    async fn collect(&self, query: &str, max_sources: usize) -> sift_common::Result<Collection>;
}

/// Runs a search then fetches every result concurrently.
pub struct ResultCollector {
    search: Arc<dyn SearchEngine>,
    fetcher: Arc<PageFetcher>,
    concurrency: usize,
}

impl ResultCollector {
    pub fn new(search: Arc<dyn SearchEngine>, fetcher: Arc<PageFetcher>, concurrency: usize) -> Self {
        Self {
            search,
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Wire the result page scraper and the fetcher over one page source.
    pub fn from_config(source: Arc<dyn PageSource>, cfg: &SiftConfig) -> sift_common::Result<Self> {
        let search = SerpSearch::from_config(source.clone(), &cfg.search)?;
        let fetcher = PageFetcher::from_config(source, &cfg.fetch);
        Ok(Self::new(
            Arc::new(search),
            Arc::new(fetcher),
            cfg.fetch.concurrency,
        ))
    }
}

#[async_trait::async_trait]
impl DocumentCollector for ResultCollector {
    #[instrument(target = "web.collect", skip(self))]
    async fn collect(&self, query: &str, max_sources: usize) -> sift_common::Result<Collection> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Collection::default());
        }

        let limit = clamp_sources(max_sources);
        let mut urls = self.search.search(query, limit).await?;
        // Engines are not trusted to honour the limit.
        urls.truncate(limit);
        let total = urls.len();

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (rank, url) in urls.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (rank, fetcher.fetch(&url).await)
            });
        }

        // Completion order is arbitrary; slots restore search rank.
        let mut slots: Vec<Option<SourceDocument>> = vec![None; total];
        let mut failures: Vec<(usize, FetchFailure)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((rank, Ok(doc))) => slots[rank] = Some(doc),
                Ok((rank, Err(failure))) => {
                    warn!(target: "web.collect", url = %failure.url, detail = %failure.detail, "page fetch failed");
                    failures.push((rank, failure));
                }
                Err(e) => warn!(target: "web.collect", error = %e, "fetch task aborted"),
            }
        }
        failures.sort_by_key(|(rank, _)| *rank);

        let documents: Vec<SourceDocument> = slots.into_iter().flatten().collect();
        info!(
            target: "web.collect",
            requested = total,
            fetched = documents.len(),
            failed = failures.len(),
            "collection finished"
        );

        Ok(Collection {
            documents,
            failures: failures.into_iter().map(|(_, f)| f).collect(),
        })
    }
}
