//! Loader for Sift configuration with YAML + environment overlays.
//!
//! Every field has a default, so Sift runs with no configuration at all.
//! Sources are merged in order: built-in defaults, an optional YAML file, then
//! `SIFT__SECTION__KEY` environment variables. String values may reference
//! other environment variables as `${VAR}`.
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use sift_common::observability::LogFormat;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Accepted values for the number of search sources analyzed per query.
pub const SOURCE_RANGE: RangeInclusive<usize> = 1..=10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub browser: BrowserConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result page URL; the query is appended as `query_param`.
    pub engine_url: String,
    pub query_param: String,
    /// CSS selector matching organic result links, in presentation order.
    pub result_selector: String,
    /// Links whose host falls under this domain are dropped.
    pub excluded_domain: String,
    pub max_sources: usize,
    pub wait_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_url: "https://www.google.com/search".into(),
            query_param: "q".into(),
            result_selector: "div.g a".into(),
            excluded_domain: "google.com".into(),
            max_sources: 5,
            wait_timeout_secs: 10,
        }
    }
}

impl SearchConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Pause after navigation so client-side rendering can settle.
    pub settle_delay_ms: u64,
    pub page_load_timeout_secs: u64,
    /// Maximum characters kept per page.
    pub content_cap: usize,
    /// Maximum characters per page when re-sent with a follow-up question.
    pub followup_cap: usize,
    /// Upper bound on concurrent page fetches within one search.
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            page_load_timeout_secs: 30,
            content_cap: 4500,
            followup_cap: 1000,
            concurrency: 10,
        }
    }
}

impl FetchConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    /// Number of WebDriver sessions kept for concurrent page loads.
    pub sessions: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            sessions: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub endpoint: String,
    pub app_id: String,
    pub connect_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://backend.buildpicoapps.com/api/chatbot/chat".into(),
            app_id: "after-consumer".into(),
            connect_timeout_secs: 15,
        }
    }
}

impl ChatConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: "info".into(),
        }
    }
}

impl SiftConfig {
    /// Reject values the pipeline cannot run with and clamp the source count
    /// into [`SOURCE_RANGE`].
    pub fn validated(mut self) -> Result<Self, ConfigLoadError> {
        if self.fetch.content_cap == 0 || self.fetch.followup_cap == 0 {
            return Err(ConfigLoadError::Invalid(
                "fetch.content_cap and fetch.followup_cap must be positive".into(),
            ));
        }
        if self.fetch.concurrency == 0 {
            return Err(ConfigLoadError::Invalid(
                "fetch.concurrency must be at least 1".into(),
            ));
        }
        if self.browser.sessions == 0 {
            return Err(ConfigLoadError::Invalid(
                "browser.sessions must be at least 1".into(),
            ));
        }
        if !(self.chat.endpoint.starts_with("ws://") || self.chat.endpoint.starts_with("wss://")) {
            return Err(ConfigLoadError::Invalid(format!(
                "chat.endpoint must be a ws:// or wss:// URL, got {}",
                self.chat.endpoint
            )));
        }
        if self.search.result_selector.trim().is_empty() {
            return Err(ConfigLoadError::Invalid(
                "search.result_selector must not be empty".into(),
            ));
        }
        self.search.max_sources = clamp_sources(self.search.max_sources);
        Ok(self)
    }
}

/// Clamp a requested source count into [`SOURCE_RANGE`].
pub fn clamp_sources(n: usize) -> usize {
    n.clamp(*SOURCE_RANGE.start(), *SOURCE_RANGE.end())
}

/// `$XDG_CONFIG_HOME/sift/sift.yaml` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sift").join("sift.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct SiftConfigLoader {
    files: Vec<(PathBuf, bool)>,
    snippets: Vec<String>,
}

impl Default for SiftConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SiftConfigLoader {
    /// Start from built-in defaults plus `SIFT__` env overrides.
    ///
    /// ```
    /// use sift_config::SiftConfigLoader;
    ///
    /// let cfg = SiftConfigLoader::new().load().expect("defaults are valid");
    /// assert_eq!(cfg.search.max_sources, 5);
    /// assert_eq!(cfg.fetch.content_cap, 4500);
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            snippets: Vec::new(),
        }
    }

    /// Attach a file that must exist; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is read only if present.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Merge an inline YAML snippet (tests and embedding).
    ///
    /// ```
    /// use sift_config::SiftConfigLoader;
    ///
    /// let cfg = SiftConfigLoader::new()
    ///     .with_yaml_str("search:\n  max_sources: 42\nfetch:\n  followup_cap: 800\n")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.search.max_sources, 10);
    /// assert_eq!(cfg.fetch.followup_cap, 800);
    /// assert_eq!(cfg.fetch.content_cap, 4500);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.snippets.push(yaml.to_string());
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and validate.
    pub fn load(self) -> Result<SiftConfig, ConfigLoadError> {
        let mut builder = Config::builder();
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.snippets {
            builder = builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("SIFT")
                .separator("__")
                .try_parsing(true),
        );

        let mut v: Value = builder.build()?.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SiftConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        typed.validated()
    }
}
