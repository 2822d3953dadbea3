use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;
use crate::error::{Result, ScraperError};
use crate::types::SelectorSet;

/// Longest timeout or delay accepted, in seconds
pub const MAX_WAIT_SECS: f64 = 3600.0;

/// Seconds to a [`Duration`], clamped to `[0, MAX_WAIT_SECS]`. NaN reads as zero.
pub fn bounded_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.min(MAX_WAIT_SECS))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub selectors: SelectorConfig,
    pub timeouts: TimeoutConfig,
    pub pacing: PacingConfig,
    pub browser: BrowserConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Replaces spaces in the search term when building the listing path
    pub path_separator: String,
    /// Appended to export file names, e.g. `laptop_mercadolibre.csv`
    pub file_suffix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            path_separator: constants::DEFAULT_PATH_SEPARATOR.to_string(),
            file_suffix: constants::DEFAULT_FILE_SUFFIX.to_string(),
        }
    }
}

impl SiteConfig {
    /// Listing URL for a search term: spaces become the site's path separator.
    pub fn listing_url(&self, search_term: &str) -> String {
        let path = search_term.trim().replace(' ', &self.path_separator);
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub cards: SelectorSet,
    pub link: SelectorSet,
    pub name: SelectorSet,
    pub price: SelectorSet,
    pub consent: SelectorSet,
    pub next_page: SelectorSet,
    /// Looked up inside the next-page control; the match is what gets clicked
    pub next_page_link: SelectorSet,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cards: constants::CARD_SELECTORS.into(),
            link: constants::LINK_SELECTORS.into(),
            name: constants::NAME_SELECTORS.into(),
            price: constants::PRICE_SELECTORS.into(),
            consent: constants::CONSENT_SELECTORS.into(),
            next_page: constants::NEXT_PAGE_SELECTORS.into(),
            next_page_link: constants::NEXT_PAGE_LINK_SELECTORS.into(),
        }
    }
}

/// Bounded-wait timeouts, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub content: f64,
    pub consent: f64,
    pub next_page: f64,
    pub poll_interval: f64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            content: 10.0,
            consent: 2.0,
            next_page: 10.0,
            poll_interval: 0.25,
        }
    }
}

impl TimeoutConfig {
    pub fn content(&self) -> Duration {
        bounded_duration(self.content)
    }

    pub fn consent(&self) -> Duration {
        bounded_duration(self.consent)
    }

    pub fn next_page(&self) -> Duration {
        bounded_duration(self.next_page)
    }

    pub fn poll_interval(&self) -> Duration {
        bounded_duration(self.poll_interval)
    }
}

/// A random delay is drawn uniformly from `[min, max]` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub const NONE: DelayRange = DelayRange { min: 0.0, max: 0.0 };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_disabled(&self) -> bool {
        self.max <= 0.0
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.min >= 0.0 && self.min <= self.max && self.max <= MAX_WAIT_SECS) {
            return Err(ScraperError::Config(format!(
                "pacing.{} must satisfy 0 <= min <= max <= {}, got [{}, {}]",
                name, MAX_WAIT_SECS, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Delays between browser actions. Each range is tuned independently.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub page_start: DelayRange,
    pub after_consent: DelayRange,
    pub after_scroll: DelayRange,
    pub before_click: DelayRange,
    pub after_advance: DelayRange,
    pub per_card: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_start: DelayRange::new(2.0, 4.0),
            after_consent: DelayRange::new(1.0, 1.0),
            after_scroll: DelayRange::new(2.0, 3.0),
            before_click: DelayRange::new(0.5, 1.5),
            after_advance: DelayRange::new(5.0, 8.0),
            per_card: DelayRange::new(0.1, 0.5),
        }
    }
}

impl PacingConfig {
    /// No delays at all; for replaying saved pages and for tests
    pub fn disabled() -> Self {
        Self {
            page_start: DelayRange::NONE,
            after_consent: DelayRange::NONE,
            after_scroll: DelayRange::NONE,
            before_click: DelayRange::NONE,
            after_advance: DelayRange::NONE,
            per_card: DelayRange::NONE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub user_agent: String,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: constants::DEFAULT_WEBDRIVER_URL.to_string(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            headless: true,
            window_size: (1920, 1080),
            extra_args: Vec::new(),
        }
    }
}

/// File format the collected records are written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Optional cap on pages visited; unbounded when absent
    pub max_pages: Option<u32>,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub export_format: ExportFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            log_dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            export_format: ExportFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default config file when it
    /// exists, falling back to built-in defaults. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(constants::DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(constants::DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCRAPER_WEBDRIVER_URL") {
            self.browser.webdriver_url = url;
        }
        if let Ok(agent) = std::env::var("SCRAPER_USER_AGENT") {
            self.browser.user_agent = agent;
        }
        if let Ok(dir) = std::env::var("SCRAPER_OUTPUT_DIR") {
            self.run.output_dir = PathBuf::from(dir);
        }
        if let Ok(headless) = std::env::var("SCRAPER_HEADLESS") {
            self.browser.headless = !matches!(headless.trim(), "0" | "false" | "no");
        }
    }

    pub fn validate(&self) -> Result<()> {
        let pacing = &self.pacing;
        pacing.page_start.validate("page_start")?;
        pacing.after_consent.validate("after_consent")?;
        pacing.after_scroll.validate("after_scroll")?;
        pacing.before_click.validate("before_click")?;
        pacing.after_advance.validate("after_advance")?;
        pacing.per_card.validate("per_card")?;

        let timeouts = [
            ("content", self.timeouts.content),
            ("consent", self.timeouts.consent),
            ("next_page", self.timeouts.next_page),
            ("poll_interval", self.timeouts.poll_interval),
        ];
        for (name, secs) in timeouts {
            if !(secs > 0.0 && secs <= MAX_WAIT_SECS) {
                return Err(ScraperError::Config(format!(
                    "timeouts.{} must be between 0 and {} seconds, got {}",
                    name, MAX_WAIT_SECS, secs
                )));
            }
        }

        let selectors = [
            ("cards", &self.selectors.cards),
            ("link", &self.selectors.link),
            ("name", &self.selectors.name),
            ("price", &self.selectors.price),
            ("consent", &self.selectors.consent),
            ("next_page", &self.selectors.next_page),
            ("next_page_link", &self.selectors.next_page_link),
        ];
        for (name, set) in selectors {
            if set.is_empty() {
                return Err(ScraperError::Config(format!(
                    "selectors.{} must list at least one selector",
                    name
                )));
            }
        }

        if self.run.max_pages == Some(0) {
            return Err(ScraperError::Config("run.max_pages must be at least 1".into()));
        }

        Ok(())
    }
}
