use crate::sift_browser::{
    launch::{capabilities, LaunchProfile},
    page::SiftPage,
};
use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, ClientBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

/// Connection settings for the WebDriver service and its session pool.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Default: `http://localhost:9515` (Chromedriver).
    pub webdriver_url: String,
    /// Maximum number of live browser sessions.
    pub sessions: usize,
    pub page_load_timeout: Duration,
    pub profile: LaunchProfile,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            sessions: 4,
            page_load_timeout: Duration::from_secs(30),
            profile: LaunchProfile::default(),
        }
    }
}

struct Pool {
    opts: DriverOptions,
    idle: Mutex<Vec<Client>>,
    opened: Mutex<Vec<Client>>,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Pool {
    async fn open_session(&self) -> Result<Client> {
        let client = ClientBuilder::native()
            .capabilities(capabilities(&self.opts.profile))
            .connect(&self.opts.webdriver_url)
            .await
            .with_context(|| {
                format!(
                    "failed to start a browser session at {}",
                    self.opts.webdriver_url
                )
            })?;
        let total = {
            let mut opened = locked(&self.opened);
            opened.push(client.clone());
            opened.len()
        };
        info!(target: "browser", sessions = total, "browser session opened");
        Ok(client)
    }

    fn release(&self, client: Client) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        locked(&self.idle).push(client);
    }
}

/// A leased session; returns the client to the pool when dropped.
pub(crate) struct Lease {
    client: Option<Client>,
    pool: Arc<Pool>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}

/// Pool of `fantoccini` WebDriver sessions shared by every page load.
///
/// Cloning is cheap; all clones lease from the same sessions.
#[derive(Clone)]
pub struct SiftDriver {
    inner: Arc<Pool>,
}

impl SiftDriver {
    /// Connect to a running WebDriver service and open the first session, so
    /// an unreachable driver is reported at startup rather than on first use.
    pub async fn connect(opts: DriverOptions) -> Result<Self> {
        let sessions = opts.sessions.max(1);
        let pool = Arc::new(Pool {
            opts,
            idle: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            permits: Arc::new(Semaphore::new(sessions)),
            closed: AtomicBool::new(false),
        });

        let first = pool.open_session().await?;
        locked(&pool.idle).push(first);

        Ok(Self { inner: pool })
    }

    /// Lease a session, opening a new one if all open sessions are busy and
    /// the pool has room. Waits when the pool is exhausted.
    pub async fn page(&self) -> Result<SiftPage> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("browser pool is closed"))?;

        let reused = locked(&self.inner.idle).pop();
        let client = match reused {
            Some(client) => client,
            None => self.inner.open_session().await?,
        };

        let lease = Lease {
            client: Some(client.clone()),
            pool: self.inner.clone(),
            _permit: permit,
        };
        Ok(SiftPage::new(
            client,
            self.inner.opts.page_load_timeout,
            lease,
        ))
    }

    /// Close every browser session. Later leases fail.
    pub async fn close(&self) -> Result<()> {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.permits.close();
        locked(&self.inner.idle).clear();

        let sessions = std::mem::take(&mut *locked(&self.inner.opened));
        let count = sessions.len();
        for client in sessions {
            if let Err(e) = client.close().await {
                warn!(target: "browser", error = %e, "failed to close browser session");
            }
        }
        info!(target: "browser", sessions = count, "browser sessions closed");
        Ok(())
    }
}
