//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{DateWindow, ListingSelectors};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing URL and date window
    pub scraping: ScrapingConfig,

    /// Chrome launch flags
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Settle delays around automation calls
    #[serde(default)]
    pub timing: TimingConfig,

    /// Stale-row retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Export file locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level and file
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Listing layout
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Configuration file not found: {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load and validate in one step; any failure is fatal for a run.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraping.url.trim().is_empty() {
            return Err(AppError::validation("scraping.url is empty"));
        }
        url::Url::parse(&self.scraping.url).map_err(|e| {
            AppError::validation(format!("scraping.url is not a valid URL: {e}"))
        })?;
        self.window()?;
        if self.scraping.source.trim().is_empty() {
            return Err(AppError::validation("scraping.source is empty"));
        }
        if !self.output.date_specific_file.contains("{date}") {
            return Err(AppError::validation(
                "output.date_specific_file must contain a {date} placeholder",
            ));
        }
        if self.output.cumulative_file.trim().is_empty() {
            return Err(AppError::validation("output.cumulative_file is empty"));
        }
        if self.output.stats_file.trim().is_empty() {
            return Err(AppError::validation("output.stats_file is empty"));
        }
        let empty = self.selectors.empty_fields();
        if !empty.is_empty() {
            return Err(AppError::validation(format!(
                "empty selectors: {}",
                empty.join(", ")
            )));
        }
        Ok(())
    }

    /// The configured publication-date window.
    pub fn window(&self) -> Result<DateWindow> {
        DateWindow::new(self.scraping.date_from, self.scraping.date_to)
    }

    /// Dated snapshot file name, keyed by the end of the window.
    pub fn snapshot_file_name(&self) -> String {
        let date = self.scraping.date_to.format("%Y_%m_%d").to_string();
        self.output.date_specific_file.replace("{date}", &date)
    }

    /// Resolve a path relative to the output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output.dir.join(file_name)
    }
}

/// What to scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// Listing page URL
    pub url: String,

    /// First publication date to keep (inclusive, `YYYY-MM-DD`)
    pub date_from: NaiveDate,

    /// Last publication date to keep (inclusive, `YYYY-MM-DD`)
    pub date_to: NaiveDate,

    /// Value written to `TENDER_SOURCE`
    #[serde(default = "defaults::source")]
    pub source: String,
}

/// Chrome launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub headless: bool,

    #[serde(default = "defaults::enabled")]
    pub maximized: bool,

    #[serde(default = "defaults::enabled")]
    pub disable_extensions: bool,

    #[serde(default = "defaults::enabled")]
    pub disable_infobars: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            maximized: true,
            disable_extensions: true,
            disable_infobars: true,
            chrome_executable: None,
        }
    }
}

/// Fixed settle delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "defaults::page_load")]
    pub page_load_ms: u64,

    #[serde(default = "defaults::modal_removal")]
    pub modal_removal_ms: u64,

    #[serde(default = "defaults::expand_row")]
    pub expand_row_ms: u64,

    #[serde(default = "defaults::collapse_row")]
    pub collapse_row_ms: u64,

    #[serde(default = "defaults::next_page")]
    pub next_page_ms: u64,

    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl TimingConfig {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }
    pub fn modal_removal(&self) -> Duration {
        Duration::from_millis(self.modal_removal_ms)
    }
    pub fn expand_row(&self) -> Duration {
        Duration::from_millis(self.expand_row_ms)
    }
    pub fn collapse_row(&self) -> Duration {
        Duration::from_millis(self.collapse_row_ms)
    }
    pub fn next_page(&self) -> Duration {
        Duration::from_millis(self.next_page_ms)
    }
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// All delays zero; used by tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            page_load_ms: 0,
            modal_removal_ms: 0,
            expand_row_ms: 0,
            collapse_row_ms: 0,
            next_page_ms: 0,
            retry_delay_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load_ms: defaults::page_load(),
            modal_removal_ms: defaults::modal_removal(),
            expand_row_ms: defaults::expand_row(),
            collapse_row_ms: defaults::collapse_row(),
            next_page_ms: defaults::next_page(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Stale-row retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries per row after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
        }
    }
}

/// Export locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding every exported file
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,

    /// Dated snapshot template; `{date}` becomes `date_to` as `YYYY_MM_DD`
    #[serde(default = "defaults::date_specific_file")]
    pub date_specific_file: String,

    /// Cumulative store file
    #[serde(default = "defaults::cumulative_file")]
    pub cumulative_file: String,

    /// Last run report (JSON)
    #[serde(default = "defaults::stats_file")]
    pub stats_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            date_specific_file: defaults::date_specific_file(),
            cumulative_file: defaults::cumulative_file(),
            stats_file: defaults::stats_file(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Log file mirrored alongside stderr
    #[serde(default = "defaults::log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            file: defaults::log_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn source() -> String {
        "ETENDERS.GOV.ZA".into()
    }
    pub fn enabled() -> bool {
        true
    }

    // Timing defaults
    pub fn page_load() -> u64 {
        7000
    }
    pub fn modal_removal() -> u64 {
        1000
    }
    pub fn expand_row() -> u64 {
        3000
    }
    pub fn collapse_row() -> u64 {
        2000
    }
    pub fn next_page() -> u64 {
        4000
    }
    pub fn retry_delay() -> u64 {
        2500
    }
    pub fn max_retries() -> u32 {
        3
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("output")
    }
    pub fn date_specific_file() -> String {
        "tenders_{date}.xlsx".into()
    }
    pub fn cumulative_file() -> String {
        "master_tenders.xlsx".into()
    }
    pub fn stats_file() -> String {
        "last_run.json".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn log_file() -> Option<PathBuf> {
        Some(PathBuf::from("logs/scraper.log"))
    }
}
