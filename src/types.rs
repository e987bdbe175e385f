use crate::error::{Result, ScraperError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie name to search for. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    folded: String,
}

impl Query {
    /// Blank names are rejected as `no_movie_name`.
    pub fn new(movie_name: &str) -> Result<Self> {
        let raw = movie_name.trim();
        if raw.is_empty() {
            return Err(ScraperError::EmptyQuery);
        }
        Ok(Self {
            raw: raw.to_string(),
            folded: raw.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-insensitive substring test against arbitrary page text.
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.folded)
    }
}

/// One found showing of the queried movie at one theater
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub theater: String,
    pub times: Option<String>,
    pub link: String,
}

/// Outcome of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Ok { body: String },
    HttpError { status: u16 },
    NetworkError { message: String },
}

impl FetchResult {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchResult::Ok { .. } => "ok",
            FetchResult::HttpError { .. } => "http_error",
            FetchResult::NetworkError { .. } => "network_error",
        }
    }
}

/// Why a theater contributed nothing to a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_id: String,
    pub theater: String,
    pub reason: String,
}

/// Result of a complete search across all configured theaters
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub movie: String,
    pub matches: Vec<Match>,
    pub failures: Vec<SourceFailure>,
    pub sources_searched: usize,
    pub pages_fetched: u32,
    /// Every searched source failed; matches is necessarily empty.
    pub degraded: bool,
    pub searched_at: DateTime<Utc>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
