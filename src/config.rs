//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::regions::Region;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon region
    #[serde(default)]
    pub region: Region,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between HTTP requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Working directory for cached records and analysis markers
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// How review listings are fetched
    #[serde(default)]
    pub mode: FetchMode,

    /// Origin classification strategy
    #[serde(default)]
    pub classifier: ClassifierKind,

    /// Pause after each scroll before measuring page height
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Pause after scrolling settles, before reading the page
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Upper bound on scrolls per page
    #[serde(default = "default_max_scrolls")]
    pub max_scrolls: u32,

    /// Stop after this many review pages (unlimited when unset)
    #[serde(default)]
    pub max_review_pages: Option<u32>,

    /// Retries for a failed fetch (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay; doubles on each further attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Characters per entity-recognition window
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Search result pages visited during discovery
    #[serde(default = "default_search_max_pages")]
    pub search_max_pages: u32,

    /// Chromium executable (auto-detected when unset)
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("json")
}

fn default_scroll_delay_ms() -> u64 {
    2000
}

fn default_settle_delay_ms() -> u64 {
    5000
}

fn default_max_scrolls() -> u32 {
    50
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_chunk_size() -> usize {
    100_000
}

fn default_search_max_pages() -> u32 {
    20
}

fn default_headless() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::Us,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            format: OutputFormat::Table,
            data_dir: default_data_dir(),
            mode: FetchMode::default(),
            classifier: ClassifierKind::default(),
            scroll_delay_ms: default_scroll_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            max_scrolls: default_max_scrolls(),
            max_review_pages: None,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            chunk_size: default_chunk_size(),
            search_max_pages: default_search_max_pages(),
            chrome_path: None,
            headless: default_headless(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with every wait and retry disabled.
    pub fn immediate() -> Self {
        Self {
            delay_ms: 0,
            delay_jitter_ms: 0,
            scroll_delay_ms: 0,
            settle_delay_ms: 0,
            max_retries: 0,
            retry_backoff_ms: 0,
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-origin").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(region) = std::env::var("AMZ_REGION") {
            if let Ok(r) = region.parse() {
                self.region = r;
            }
        }

        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("AMZ_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(dir) = std::env::var("AMZ_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(mode) = std::env::var("AMZ_MODE") {
            if let Ok(m) = mode.parse() {
                self.mode = m;
            }
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// How review listing pages are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Headless Chromium, scrolling to trigger lazy-loaded reviews.
    #[default]
    Browser,
    /// Plain HTTP GET of `?pageNumber=N`.
    Http,
}

impl std::str::FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "browser" | "chrome" => Ok(FetchMode::Browser),
            "http" => Ok(FetchMode::Http),
            _ => Err(format!("Unknown fetch mode: {}. Use: browser, http", s)),
        }
    }
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMode::Browser => write!(f, "browser"),
            FetchMode::Http => write!(f, "http"),
        }
    }
}

/// Which origin classifier to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    Lexical,
    Model,
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lexical" | "ner" => Ok(ClassifierKind::Lexical),
            "model" => Ok(ClassifierKind::Model),
            _ => Err(format!("Unknown classifier: {}. Use: lexical, model", s)),
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Lexical => write!(f, "lexical"),
            ClassifierKind::Model => write!(f, "model"),
        }
    }
}
