use crate::sift_browser::driver::Lease;
use anyhow::{anyhow, Result};
use fantoccini::{elements::Element, Client, Locator};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// A browser session leased from [`SiftDriver`](super::driver::SiftDriver).
///
/// The session goes back to the pool when the page is dropped.
pub struct SiftPage {
    client: Client,
    load_timeout: Duration,
    _lease: Lease,
}

impl SiftPage {
    pub(crate) fn new(client: Client, load_timeout: Duration, lease: Lease) -> Self {
        Self {
            client,
            load_timeout,
            _lease: lease,
        }
    }

    /// Navigate to `url`, failing if the load takes longer than the
    /// configured page load timeout.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(target: "browser", %url, "navigating");
        timeout(self.load_timeout, self.client.goto(url))
            .await
            .map_err(|_| anyhow!("page load timed out after {:?}", self.load_timeout))??;
        Ok(())
    }

    /// Give client-side scripts time to render.
    pub async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    /// Return the rendered page HTML.
    pub async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    /// Wait up to `bound` for at least one element matching `selector`, then
    /// return every match in document order.
    pub async fn wait_for_elements(
        &self,
        selector: &str,
        bound: Duration,
    ) -> Result<Vec<SiftElement>> {
        self.client
            .wait()
            .at_most(bound)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| anyhow!("no element matched `{selector}` within {bound:?}: {e}"))?;

        let elements = self.client.find_all(Locator::Css(selector)).await?;
        Ok(elements.into_iter().map(SiftElement::new).collect())
    }
}

/// DOM element handle exposing the link target the scraper reads.
#[derive(Clone)]
pub struct SiftElement {
    element: Element,
}

impl SiftElement {
    fn new(element: Element) -> Self {
        Self { element }
    }

    /// Resolved (absolute) link target, read from the DOM property rather
    /// than the raw attribute.
    pub async fn href(&self) -> Result<Option<String>> {
        self.element.prop("href").await.map_err(anyhow::Error::from)
    }
}
