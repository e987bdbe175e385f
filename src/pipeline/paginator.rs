use crate::app::ports::{HttpClientPort, PolitenessPort};
use crate::config::SourceDescriptor;
use crate::parser::{Extraction, Extractor, NextPagePredicate};
use crate::types::{FetchResult, Match, Query};
use scraper::Html;
use tracing::{debug, info, warn};

/// Why a paginated sweep over one base URL ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The page carried no listings at all.
    NoListings,
    NoNextPage,
    PageCeiling,
    /// A page could not be fetched; earlier pages still count.
    FetchFailed { page: u32, reason: String },
}

#[derive(Debug, Clone)]
pub struct PaginationRun {
    pub base_url: String,
    pub matches: Vec<Match>,
    pub pages_fetched: u32,
    pub stop: StopReason,
}

impl PaginationRun {
    /// Not even the first page came back.
    pub fn failed_outright(&self) -> bool {
        self.pages_fetched == 0
    }
}

/// Drives one extractor across the pages of one base URL.
///
/// Pages are fetched strictly in order because each continue decision
/// depends on the previous page. The sweep stops on a fetch failure, a page
/// without listings, a missing next-page affordance, or the page ceiling.
pub struct Paginator<'a> {
    source: &'a SourceDescriptor,
    extractor: &'a dyn Extractor,
    next_page: &'a dyn NextPagePredicate,
    http: &'a dyn HttpClientPort,
    politeness: &'a dyn PolitenessPort,
}

impl<'a> Paginator<'a> {
    pub fn new(
        source: &'a SourceDescriptor,
        extractor: &'a dyn Extractor,
        next_page: &'a dyn NextPagePredicate,
        http: &'a dyn HttpClientPort,
        politeness: &'a dyn PolitenessPort,
    ) -> Self {
        Self {
            source,
            extractor,
            next_page,
            http,
            politeness,
        }
    }

    pub async fn run(&self, base_url: &str, query: &Query) -> PaginationRun {
        let mut matches = Vec::new();
        let mut pages_fetched = 0;
        let mut page = 1;

        let stop = loop {
            let url = self.source.page_url(base_url, page);
            debug!(%url, page, "Fetching page");

            let result = self.http.fetch(&url).await;
            debug!(page, outcome = result.kind(), "Page fetch finished");
            let body = match result {
                FetchResult::Ok { body } => body,
                FetchResult::HttpError { status } => {
                    warn!(%url, status, "Stopping pagination on HTTP error");
                    break StopReason::FetchFailed {
                        page,
                        reason: format!("HTTP status {} from {}", status, url),
                    };
                }
                FetchResult::NetworkError { message } => {
                    warn!(%url, "Stopping pagination on network error: {}", message);
                    break StopReason::FetchFailed {
                        page,
                        reason: format!("{} ({})", message, url),
                    };
                }
            };
            pages_fetched += 1;

            let (extraction, has_next) = self.scan(&body, query);
            debug!(
                page,
                listings = extraction.listings,
                hits = extraction.hits.len(),
                "Extracted page"
            );
            matches.extend(extraction.hits.into_iter().map(|hit| Match {
                theater: self.source.display_name.clone(),
                times: hit.times,
                link: url.clone(),
            }));

            if extraction.listings == 0 {
                break StopReason::NoListings;
            }
            if !has_next {
                break StopReason::NoNextPage;
            }
            if page >= self.source.max_pages {
                break StopReason::PageCeiling;
            }
            page += 1;
            self.politeness.pause().await;
        };

        info!(
            base_url,
            pages_fetched,
            matches = matches.len(),
            stop = ?stop,
            "Pagination finished"
        );

        PaginationRun {
            base_url: base_url.to_string(),
            matches,
            pages_fetched,
            stop,
        }
    }

    // The parsed document is not Send; keep it out of any await.
    fn scan(&self, body: &str, query: &Query) -> (Extraction, bool) {
        let document = Html::parse_document(body);
        let extraction = self.extractor.extract(&document, query);
        let has_next = self.next_page.has_next_page(&document);
        (extraction, has_next)
    }
}
