//! Page extraction strategies.
//!
//! An [`Extractor`] looks at one parsed listing page and reports how many
//! listings it saw and which of them match the query. Extraction never fails:
//! markup that lacks the expected elements simply yields nothing.

pub mod full_text;
pub mod markup;
pub mod next_page;

use crate::config::ExtractionStrategy;
use crate::error::{Result, ScraperError};
use crate::types::Query;
use scraper::{Html, Selector};

pub use full_text::FullTextExtractor;
pub use markup::MarkupExtractor;
pub use next_page::{next_page_predicate, NextPagePredicate};

/// One matching listing before it is labelled with a theater and link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub times: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Listings present on the page, matching or not. Zero means the
    /// page is past the end of real content.
    pub listings: usize,
    pub hits: Vec<Hit>,
}

pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Html, query: &Query) -> Extraction;
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScraperError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

pub fn extractor_for(strategy: &ExtractionStrategy) -> Result<Box<dyn Extractor>> {
    match strategy {
        ExtractionStrategy::Markup {
            title_selector,
            showtime_selector,
        } => Ok(Box::new(MarkupExtractor::new(
            title_selector,
            showtime_selector,
        )?)),
        ExtractionStrategy::FullText => Ok(Box::new(FullTextExtractor::new())),
    }
}
