use super::parse_selector;
use crate::config::NextPageRule;
use crate::error::Result;
use scraper::{Html, Selector};

/// Decides whether a listing page links to a further page.
pub trait NextPagePredicate: Send + Sync {
    fn has_next_page(&self, document: &Html) -> bool;
}

pub struct SelectorPresent(Selector);

impl NextPagePredicate for SelectorPresent {
    fn has_next_page(&self, document: &Html) -> bool {
        document.select(&self.0).next().is_some()
    }
}

pub struct AlwaysNext;

impl NextPagePredicate for AlwaysNext {
    fn has_next_page(&self, _document: &Html) -> bool {
        true
    }
}

pub struct NeverNext;

impl NextPagePredicate for NeverNext {
    fn has_next_page(&self, _document: &Html) -> bool {
        false
    }
}

pub fn next_page_predicate(rule: &NextPageRule) -> Result<Box<dyn NextPagePredicate>> {
    Ok(match rule {
        NextPageRule::Selector { selector } => Box::new(SelectorPresent(parse_selector(selector)?)),
        NextPageRule::Always => Box::new(AlwaysNext),
        NextPageRule::Never => Box::new(NeverNext),
    })
}
