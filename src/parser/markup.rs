use super::{parse_selector, Extraction, Extractor, Hit};
use crate::error::Result;
use crate::types::Query;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Title/showtime lookup for sites with stable listing markup.
///
/// Every element matching the title selector is a listing. A matching
/// listing takes the text of the first showtime element that follows it in
/// document order (its own descendants included), as long as no other
/// listing starts in between.
pub struct MarkupExtractor {
    title: Selector,
    showtime: Selector,
}

impl MarkupExtractor {
    pub fn new(title_selector: &str, showtime_selector: &str) -> Result<Self> {
        Ok(Self {
            title: parse_selector(title_selector)?,
            showtime: parse_selector(showtime_selector)?,
        })
    }
}

impl Extractor for MarkupExtractor {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn extract(&self, document: &Html, query: &Query) -> Extraction {
        let mut extraction = Extraction::default();
        // index of the hit still waiting for its showtime
        let mut pending: Option<usize> = None;

        for element in document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
        {
            if self.title.matches(&element) {
                extraction.listings += 1;
                pending = None;
                let title = element.text().collect::<String>();
                if query.matches(&title) {
                    debug!(title = title.trim(), "Title matched query");
                    extraction.hits.push(Hit { times: None });
                    pending = Some(extraction.hits.len() - 1);
                }
            } else if self.showtime.matches(&element) {
                if let Some(idx) = pending.take() {
                    let times = element.text().collect::<String>().trim().to_string();
                    if !times.is_empty() {
                        extraction.hits[idx].times = Some(times);
                    }
                }
            }
        }

        extraction
    }
}
