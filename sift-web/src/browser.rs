use anyhow::Result;
use sift_common::SiftError;
use sift_drivers::sift_browser::driver::SiftDriver;
use sift_drivers::sift_browser::page::SiftPage;
use std::time::Duration;
use tracing::debug;

/// Renders pages for the fetcher and the search scraper.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Load `url`, wait `settle` for dynamic content, and return the rendered
    /// HTML.
    async fn render(&self, url: &str, settle: Duration) -> Result<String>;

    /// Load `url`, wait up to `bound` for `selector` to match, and return the
    /// resolved `href` of every match in document order.
    async fn links(&self, url: &str, selector: &str, bound: Duration) -> Result<Vec<String>>;
}

/// Page source backed by the pooled WebDriver sessions.
#[derive(Clone)]
pub struct DriverPageSource {
    driver: SiftDriver,
}

impl DriverPageSource {
    pub fn new(driver: SiftDriver) -> Self {
        Self { driver }
    }

    async fn lease(&self) -> Result<SiftPage> {
        self.driver.page().await.map_err(browser_error)
    }
}

/// Session pool failures surface as [`SiftError::Browser`].
fn browser_error(e: anyhow::Error) -> anyhow::Error {
    SiftError::Browser(format!("{e:#}")).into()
}

#[async_trait::async_trait]
impl PageSource for DriverPageSource {
    async fn render(&self, url: &str, settle: Duration) -> Result<String> {
        let page = self.lease().await?;
        page.goto(url).await?;
        page.settle(settle).await;
        page.content().await
    }

    async fn links(&self, url: &str, selector: &str, bound: Duration) -> Result<Vec<String>> {
        let page = self.lease().await?;
        page.goto(url).await?;

        let elements = page.wait_for_elements(selector, bound).await?;
        let mut hrefs = Vec::with_capacity(elements.len());
        for element in elements {
            match element.href().await {
                Ok(Some(href)) => hrefs.push(href),
                Ok(None) => {}
                Err(e) => debug!(target: "web.search", error = %e, "unreadable result link"),
            }
        }
        Ok(hrefs)
    }
}
