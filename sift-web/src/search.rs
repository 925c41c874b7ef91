use crate::browser::PageSource;
use sift_common::SiftError;
use sift_config::SearchConfig;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Turns a query into a ranked list of result page URLs.
#[async_trait::async_trait]
pub trait SearchEngine: Send + Sync {
    /// At most `limit` result URLs in the engine's presentation order.
    async fn search(&self, query: &str, limit: usize) -> sift_common::Result<Vec<String>>;
}

/// Scrapes organic result links off a search engine's result page.
pub struct SerpSearch {
    source: Arc<dyn PageSource>,
    engine_url: Url,
    query_param: String,
    selector: String,
    excluded_domain: String,
    wait: Duration,
}

impl SerpSearch {
    pub fn from_config(source: Arc<dyn PageSource>, cfg: &SearchConfig) -> sift_common::Result<Self> {
        let engine_url = Url::parse(&cfg.engine_url)
            .map_err(|e| SiftError::Config(format!("search.engine_url {}: {e}", cfg.engine_url)))?;
        Ok(Self {
            source,
            engine_url,
            query_param: cfg.query_param.clone(),
            selector: cfg.result_selector.clone(),
            excluded_domain: cfg.excluded_domain.clone(),
            wait: cfg.wait_timeout(),
        })
    }

    /// Result page address for `query`, percent-encoded.
    pub fn results_url(&self, query: &str) -> Url {
        let mut url = self.engine_url.clone();
        url.query_pairs_mut().append_pair(&self.query_param, query);
        url
    }
}

#[async_trait::async_trait]
impl SearchEngine for SerpSearch {
    async fn search(&self, query: &str, limit: usize) -> sift_common::Result<Vec<String>> {
        let url = self.results_url(query);
        debug!(target: "web.search", %url, selector = %self.selector, "loading result page");

        let hrefs = self
            .source
            .links(url.as_str(), &self.selector, self.wait)
            .await
            .map_err(|e| SiftError::Search(format!("{e:#}")))?;

        let found = hrefs.len();
        let kept = filter_result_links(hrefs, &self.excluded_domain, limit);
        info!(target: "web.search", found, kept = kept.len(), "result links selected");
        Ok(kept)
    }
}

/// Keep the first `limit` distinct http(s) links that do not point back into
/// `excluded_domain`. Redirect wrappers hosted on the excluded domain are
/// unwrapped to their target first.
pub fn filter_result_links(
    hrefs: impl IntoIterator<Item = String>,
    excluded_domain: &str,
    limit: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for href in hrefs {
        if kept.len() >= limit {
            break;
        }
        let Ok(parsed) = Url::parse(href.trim()) else {
            continue;
        };
        let parsed = unwrap_redirect(parsed, excluded_domain);
        if !matches!(parsed.scheme(), "http" | "https") {
            continue;
        }
        if host_in_domain(&parsed, excluded_domain) {
            continue;
        }

        let mut key = parsed.clone();
        key.set_fragment(None);
        if seen.insert(key.to_string()) {
            kept.push(parsed.to_string());
        }
    }
    kept
}

fn host_in_domain(url: &Url, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    match url.host_str() {
        Some(host) => {
            let host = host.trim_start_matches("www.");
            host.eq_ignore_ascii_case(domain)
                || host
                    .to_ascii_lowercase()
                    .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
        }
        None => false,
    }
}

/// `https://www.google.com/url?q=https://target/...` style links.
fn unwrap_redirect(url: Url, excluded_domain: &str) -> Url {
    if !host_in_domain(&url, excluded_domain) || url.path() != "/url" {
        return url;
    }
    let target = url
        .query_pairs()
        .find(|(k, _)| k == "q" || k == "url")
        .and_then(|(_, v)| Url::parse(&v).ok());
    target.unwrap_or(url)
}
