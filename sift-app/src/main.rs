use anyhow::{Context, Result, anyhow};
use clap::Parser;
use sift_common::observability::{LogConfig, init_logging};
use sift_config::{SiftConfig, SiftConfigLoader, clamp_sources, default_config_path};
use sift_drivers::sift_browser::driver::{DriverOptions, SiftDriver};
use sift_drivers::sift_browser::launch::LaunchProfile;
use std::path::PathBuf;
use tether::{Tether, build_from_config};
use tracing::{info, warn};
mod tether;

/// Search the web, read the top results, and stream a synthesized answer.
#[derive(Parser, Debug)]
#[command(name = "sift", version)]
struct Cli {
    /// YAML config file. Without it the per-user config is read if present.
    #[arg(long, short, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,

    /// Pages analyzed per search (1 to 10).
    #[arg(long, short = 'n')]
    sources: Option<usize>,
}

fn load_config(cli: &Cli) -> Result<SiftConfig> {
    let mut loader = SiftConfigLoader::new();
    loader = match (&cli.config, default_config_path()) {
        (Some(path), _) => loader.with_file(path),
        (None, Some(path)) => loader.with_optional_file(path),
        (None, None) => loader,
    };
    let mut cfg = loader.load()?;

    if cli.headless {
        cfg.browser.headless = true;
    }
    if let Some(n) = cli.sources {
        cfg.search.max_sources = clamp_sources(n);
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().map_err(|e| anyhow!("{e}"))?;
    let cli = Cli::parse();

    // 1) Config: file, then SIFT_* env, then flags
    let cfg = load_config(&cli)?;

    // 2) Logging goes to a file; the console owns the terminal
    let log_path = init_logging(LogConfig {
        app_name: "sift",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: false,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    info!(log = %log_path.display(), sources = cfg.search.max_sources, "sift starting");

    // 3) Browser sessions live for the whole process
    let driver = SiftDriver::connect(DriverOptions {
        webdriver_url: cfg.browser.webdriver_url.clone(),
        sessions: cfg.browser.sessions,
        page_load_timeout: cfg.fetch.page_load_timeout(),
        profile: LaunchProfile::default().headless(cfg.browser.headless),
    })
    .await
    .with_context(|| format!("no WebDriver reachable at {}", cfg.browser.webdriver_url))?;

    let mut tether = Tether::new();
    let outcome = match build_from_config(&mut tether, &cfg, driver.clone()) {
        Ok(()) => tether.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = driver.close().await {
        warn!(error = %e, "closing browser sessions failed");
    }
    info!("sift stopped");
    outcome
}
