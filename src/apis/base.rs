use crate::app::ports::{HttpClientPort, PolitenessPort};
use crate::config::SourceDescriptor;
use crate::error::Result;
use crate::parser::{extractor_for, next_page_predicate, Extractor, NextPagePredicate};
use crate::pipeline::paginator::{PaginationRun, Paginator, StopReason};
use crate::types::{Match, Query};
use tracing::{info, instrument, warn};

/// Everything one theater contributed to a search
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source_id: String,
    pub theater: String,
    pub matches: Vec<Match>,
    pub pages_fetched: u32,
    /// Set when no location returned even a first page.
    pub failure: Option<String>,
}

impl SourceOutcome {
    pub fn failed(source_id: &str, theater: &str, reason: String) -> Self {
        Self {
            source_id: source_id.to_string(),
            theater: theater.to_string(),
            matches: Vec::new(),
            pages_fetched: 0,
            failure: Some(reason),
        }
    }
}

/// A configured theater: its locations, page template and extraction
/// strategy, bound into something that can be searched.
pub struct SourceAdapter {
    descriptor: SourceDescriptor,
    extractor: Box<dyn Extractor>,
    next_page: Box<dyn NextPagePredicate>,
}

impl SourceAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Result<Self> {
        let extractor = extractor_for(&descriptor.strategy)?;
        let next_page = next_page_predicate(&descriptor.next_page)?;
        Ok(Self {
            descriptor,
            extractor,
            next_page,
        })
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    /// Sweep every location in order; location 1 results precede location 2.
    #[instrument(skip_all, fields(source = %self.descriptor.id, strategy = self.extractor.name()))]
    pub async fn search(
        &self,
        query: &Query,
        http: &dyn HttpClientPort,
        politeness: &dyn PolitenessPort,
    ) -> SourceOutcome {
        let paginator = Paginator::new(
            &self.descriptor,
            self.extractor.as_ref(),
            self.next_page.as_ref(),
            http,
            politeness,
        );

        let mut runs: Vec<PaginationRun> = Vec::with_capacity(self.descriptor.base_urls.len());
        for base_url in &self.descriptor.base_urls {
            runs.push(paginator.run(base_url, query).await);
        }

        let pages_fetched = runs.iter().map(|r| r.pages_fetched).sum();
        let failure = if runs.iter().all(PaginationRun::failed_outright) {
            let reasons: Vec<String> = runs
                .iter()
                .map(|r| match &r.stop {
                    StopReason::FetchFailed { reason, .. } => reason.clone(),
                    other => format!("{:?}", other),
                })
                .collect();
            Some(reasons.join("; "))
        } else {
            None
        };

        let matches: Vec<Match> = runs.into_iter().flat_map(|r| r.matches).collect();
        match &failure {
            Some(reason) => warn!("Every location failed: {}", reason),
            None => info!(matches = matches.len(), pages_fetched, "Source searched"),
        }

        SourceOutcome {
            source_id: self.descriptor.id.clone(),
            theater: self.descriptor.display_name.clone(),
            matches,
            pages_fetched,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractionStrategy, NextPageRule};
    use crate::constants::FULL_TEXT_TIMES_PLACEHOLDER;
    use crate::infra::politeness::FixedDelay;
    use crate::test_support::FakeHttp;
    use std::time::Duration;

    fn two_location_source() -> SourceDescriptor {
        SourceDescriptor {
            id: "traumpalast".to_string(),
            display_name: "Traumpalast Leonberg".to_string(),
            base_urls: vec![
                "http://tp.test/PID/1".to_string(),
                "http://tp.test/PID/2".to_string(),
            ],
            page_template: ".html?page={page}".to_string(),
            strategy: ExtractionStrategy::FullText,
            max_pages: 5,
            next_page: NextPageRule::Never,
            enabled: true,
            homepage: None,
            politeness: None,
        }
    }

    #[tokio::test]
    async fn test_locations_concatenated_in_order() {
        let http = FakeHttp::new()
            .page("http://tp.test/PID/1.html?page=1", "<body>Jawan</body>".to_string())
            .page("http://tp.test/PID/2.html?page=1", "<body>JAWAN OmU</body>".to_string());
        let adapter = SourceAdapter::new(two_location_source()).unwrap();
        let outcome = adapter
            .search(&Query::new("jawan").unwrap(), &http, &FixedDelay::new(Duration::ZERO))
            .await;

        assert!(outcome.failure.is_none());
        let links: Vec<_> = outcome.matches.iter().map(|m| m.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["http://tp.test/PID/1.html?page=1", "http://tp.test/PID/2.html?page=1"]
        );
        assert!(outcome
            .matches
            .iter()
            .all(|m| m.theater == "Traumpalast Leonberg"
                && m.times.as_deref() == Some(FULL_TEXT_TIMES_PLACEHOLDER)));
    }

    #[tokio::test]
    async fn test_one_location_down_is_not_a_failure() {
        let http = FakeHttp::new()
            .status("http://tp.test/PID/1.html?page=1", 500)
            .page("http://tp.test/PID/2.html?page=1", "<body>Jawan</body>".to_string());
        let adapter = SourceAdapter::new(two_location_source()).unwrap();
        let outcome = adapter
            .search(&Query::new("jawan").unwrap(), &http, &FixedDelay::new(Duration::ZERO))
            .await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_all_locations_down_is_a_failure() {
        let http = FakeHttp::new().status("http://tp.test/PID/1.html?page=1", 404);
        let adapter = SourceAdapter::new(two_location_source()).unwrap();
        let outcome = adapter
            .search(&Query::new("jawan").unwrap(), &http, &FixedDelay::new(Duration::ZERO))
            .await;

        let reason = outcome.failure.unwrap();
        assert!(reason.contains("HTTP status 404"));
        assert!(reason.contains("dns error"));
        assert!(outcome.matches.is_empty());
    }
}
