use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::parser::parse_selector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a page is tested for the queried movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Structured lookup of title elements and their following showtime element.
    Markup {
        title_selector: String,
        showtime_selector: String,
    },
    /// Readable-text substring search, one match per page at most.
    FullText,
}

impl ExtractionStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionStrategy::Markup { .. } => "markup",
            ExtractionStrategy::FullText => "full_text",
        }
    }
}

/// How a source signals that another page of listings exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum NextPageRule {
    /// Present iff the selector matches somewhere on the page.
    Selector { selector: String },
    /// Always present; the page ceiling ends the sweep.
    Always,
    /// Single-page source.
    Never,
}

impl Default for NextPageRule {
    fn default() -> Self {
        NextPageRule::Selector {
            selector: DEFAULT_NEXT_PAGE_SELECTOR.to_string(),
        }
    }
}

/// Pause between successive page requests to the same origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolitenessPolicy {
    Fixed { delay_ms: u64 },
    TokenBucket { requests_per_min: u64 },
}

impl Default for PolitenessPolicy {
    fn default() -> Self {
        PolitenessPolicy::Fixed {
            delay_ms: DEFAULT_POLITENESS_DELAY_MS,
        }
    }
}

impl PolitenessPolicy {
    /// No waiting at all; used by tests and fixture runs.
    pub fn none() -> Self {
        PolitenessPolicy::Fixed { delay_ms: 0 }
    }
}

/// Static description of one theater
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub display_name: String,
    /// One entry per physical location, searched in order.
    pub base_urls: Vec<String>,
    /// Appended to each base URL; `{page}` or `{}` takes the page number.
    pub page_template: String,
    pub strategy: ExtractionStrategy,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub next_page: NextPageRule,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Canonical entry point shown in source listings.
    #[serde(default)]
    pub homepage: Option<String>,
    /// Overrides the global politeness policy for this theater.
    #[serde(default)]
    pub politeness: Option<PolitenessPolicy>,
}

impl SourceDescriptor {
    pub fn page_url(&self, base_url: &str, page: u32) -> String {
        let suffix = if self.page_template.contains(PAGE_PLACEHOLDER) {
            self.page_template
                .replace(PAGE_PLACEHOLDER, &page.to_string())
        } else {
            self.page_template
                .replacen(BARE_PLACEHOLDER, &page.to_string(), 1)
        };
        format!("{}{}", base_url, suffix)
    }

    pub fn canonical_link(&self) -> &str {
        self.homepage
            .as_deref()
            .or_else(|| self.base_urls.first().map(String::as_str))
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        let fail = |msg: &str| ScraperError::Config(format!("source '{}': {}", self.id, msg));

        if self.id.trim().is_empty() {
            return Err(ScraperError::Config("source with empty id".to_string()));
        }
        if self.base_urls.is_empty() {
            return Err(fail("no base URLs"));
        }
        if self.max_pages == 0 {
            return Err(fail("max_pages must be at least 1"));
        }
        if !self.page_template.contains(PAGE_PLACEHOLDER)
            && !self.page_template.contains(BARE_PLACEHOLDER)
        {
            return Err(fail("page_template has no page placeholder"));
        }
        if let ExtractionStrategy::Markup {
            title_selector,
            showtime_selector,
        } = &self.strategy
        {
            parse_selector(title_selector)?;
            parse_selector(showtime_selector)?;
        }
        if let NextPageRule::Selector { selector } = &self.next_page {
            parse_selector(selector)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Run theaters on independent workers instead of one after another.
    #[serde(default = "default_true")]
    pub concurrent: bool,
    #[serde(default)]
    pub politeness: PolitenessPolicy,
    #[serde(default = "builtin_sources")]
    pub sources: Vec<SourceDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_timeout(),
            concurrent: true,
            politeness: PolitenessPolicy::default(),
            sources: builtin_sources(),
        }
    }
}

impl Config {
    pub fn with_sources(sources: Vec<SourceDescriptor>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        info!(path = %path.display(), sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }

    /// Explicit path, then `SHOWTIME_CONFIG`, then `config.toml` if present,
    /// otherwise the built-in theater table.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Self::load(&PathBuf::from(path));
            }
        }
        let local = Path::new(DEFAULT_CONFIG_PATH);
        if local.exists() {
            return Self::load(local);
        }
        debug!("No configuration file found, using built-in theaters");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sources.iter().any(|s| s.enabled) {
            return Err(ScraperError::Config("no enabled sources".to_string()));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(ScraperError::Config(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
            source.validate()?;
        }
        Ok(())
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Restrict to the named ids, keeping configured priority order.
    pub fn select_sources(&self, ids: &[String]) -> Result<Vec<SourceDescriptor>> {
        if let Some(unknown) = ids
            .iter()
            .find(|id| !self.sources.iter().any(|s| &s.id == *id))
        {
            return Err(ScraperError::Config(format!("unknown source '{}'", unknown)));
        }
        Ok(self
            .enabled_sources()
            .filter(|s| ids.is_empty() || ids.contains(&s.id))
            .cloned()
            .collect())
    }

    /// Copy of this configuration searching only the named sources.
    pub fn restricted_to(&self, ids: &[String]) -> Result<Config> {
        Ok(Config {
            sources: self.select_sources(ids)?,
            ..self.clone()
        })
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_true() -> bool {
    true
}

fn builtin_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            id: CINEMAXX.to_string(),
            display_name: CINEMAXX_NAME.to_string(),
            base_urls: vec![
                "https://www.cinemaxx.de/stuttgart-si-centrum".to_string(),
                "https://www.cinemaxx.de/stuttgart".to_string(),
            ],
            page_template: "?page={page}".to_string(),
            strategy: ExtractionStrategy::Markup {
                title_selector: MOVIE_TITLE_SELECTOR.to_string(),
                showtime_selector: SHOWTIME_SELECTOR.to_string(),
            },
            max_pages: DEFAULT_MAX_PAGES,
            next_page: NextPageRule::default(),
            enabled: true,
            homepage: Some("https://www.cinemaxx.de/".to_string()),
            politeness: None,
        },
        SourceDescriptor {
            id: CAPITOL.to_string(),
            display_name: CAPITOL_NAME.to_string(),
            base_urls: vec!["https://capitol-kornwestheim.de".to_string()],
            page_template: "/programm?page={page}".to_string(),
            strategy: ExtractionStrategy::FullText,
            max_pages: DEFAULT_MAX_PAGES,
            next_page: NextPageRule::default(),
            enabled: true,
            homepage: Some("https://capitol-kornwestheim.de/".to_string()),
            politeness: None,
        },
        SourceDescriptor {
            id: TRAUMPALAST.to_string(),
            display_name: TRAUMPALAST_NAME.to_string(),
            base_urls: vec![
                "https://leonberg.traumpalast.de/index.php/PID/5796".to_string(),
                "https://leonberg.traumpalast.de/index.php/PID/5842".to_string(),
            ],
            page_template: ".html?page={page}".to_string(),
            strategy: ExtractionStrategy::FullText,
            max_pages: DEFAULT_MAX_PAGES,
            next_page: NextPageRule::default(),
            enabled: true,
            homepage: Some("https://leonberg.traumpalast.de/".to_string()),
            politeness: None,
        },
        SourceDescriptor {
            id: LOKAHFILMS.to_string(),
            display_name: LOKAHFILMS_NAME.to_string(),
            base_urls: vec!["https://www.lokahfilms.com/events".to_string()],
            page_template: "?page={page}".to_string(),
            strategy: ExtractionStrategy::FullText,
            max_pages: DEFAULT_MAX_PAGES,
            next_page: NextPageRule::default(),
            enabled: true,
            homepage: Some("https://www.lokahfilms.com/events/".to_string()),
            politeness: None,
        },
    ]
}
