use crate::apis::{create_adapters, SourceAdapter, SourceOutcome};
use crate::app::ports::{HttpClientPort, PolitenessPort};
use crate::config::{Config, PolitenessPolicy};
use crate::error::Result;
use crate::infra::http_client::ReqwestHttp;
use crate::infra::politeness::politeness_for;
use crate::observability::metrics::SearchMetrics;
use crate::types::{Match, Query, SearchReport, SourceFailure};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Runs every configured theater against one query and merges the results
/// in configured priority order.
///
/// A theater that fails entirely is recorded and skipped; the search itself
/// never fails because of network conditions.
pub struct Aggregator {
    adapters: Vec<Arc<SourceAdapter>>,
    http: Arc<dyn HttpClientPort>,
    politeness: PolitenessPolicy,
    concurrent: bool,
}

impl Aggregator {
    pub fn new(
        adapters: Vec<SourceAdapter>,
        http: Arc<dyn HttpClientPort>,
        politeness: PolitenessPolicy,
        concurrent: bool,
    ) -> Self {
        Self {
            adapters: adapters.into_iter().map(Arc::new).collect(),
            http,
            politeness,
            concurrent,
        }
    }

    /// Enabled theaters from the configuration, fetched over reqwest.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Arc::new(ReqwestHttp::from_config(config)?);
        Self::with_client(config, http)
    }

    pub fn with_client(config: &Config, http: Arc<dyn HttpClientPort>) -> Result<Self> {
        let sources: Vec<_> = config.enabled_sources().cloned().collect();
        Ok(Self::new(
            create_adapters(&sources)?,
            http,
            config.politeness.clone(),
            config.concurrent,
        ))
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    /// Ordered matches: source priority, then page, then position on page.
    pub async fn search(&self, query: &Query) -> Vec<Match> {
        self.search_report(query).await.matches
    }

    #[instrument(skip(self, query), fields(movie = query.as_str()))]
    pub async fn search_report(&self, query: &Query) -> SearchReport {
        let started = Instant::now();
        info!(sources = self.adapters.len(), concurrent = self.concurrent, "Starting search");

        let outcomes = if self.concurrent {
            self.run_concurrent(query).await
        } else {
            self.run_sequential(query).await
        };

        let report = merge(query, outcomes);
        let elapsed = started.elapsed().as_secs_f64();
        SearchMetrics::record_search(elapsed, report.matches.len(), report.degraded);

        if report.degraded {
            error!(
                failures = report.failures.len(),
                "Search degraded: every source failed"
            );
        } else if report.is_empty() {
            info!(elapsed, "No showtimes found");
        } else {
            info!(matches = report.matches.len(), elapsed, "Search finished");
        }
        report
    }

    fn politeness_of(&self, adapter: &SourceAdapter) -> Arc<dyn PolitenessPort> {
        politeness_for(
            adapter
                .descriptor()
                .politeness
                .as_ref()
                .unwrap_or(&self.politeness),
        )
    }

    async fn run_sequential(&self, query: &Query) -> Vec<SourceOutcome> {
        let mut outcomes = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let politeness = self.politeness_of(adapter);
            outcomes.push(
                adapter
                    .search(query, self.http.as_ref(), politeness.as_ref())
                    .await,
            );
        }
        outcomes
    }

    // One worker per theater. Handles are awaited in configured order, so
    // completion order never affects the merged result.
    async fn run_concurrent(&self, query: &Query) -> Vec<SourceOutcome> {
        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let politeness = self.politeness_of(adapter);
                let adapter = Arc::clone(adapter);
                let http = Arc::clone(&self.http);
                let query = query.clone();
                tokio::spawn(async move {
                    adapter
                        .search(&query, http.as_ref(), politeness.as_ref())
                        .await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (adapter, handle) in self.adapters.iter().zip(handles) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(source = adapter.id(), "Source worker aborted: {}", e);
                    outcomes.push(SourceOutcome::failed(
                        adapter.id(),
                        adapter.display_name(),
                        format!("worker aborted: {}", e),
                    ));
                }
            }
        }
        outcomes
    }
}

fn merge(query: &Query, outcomes: Vec<SourceOutcome>) -> SearchReport {
    let sources_searched = outcomes.len();
    let degraded = !outcomes.is_empty() && outcomes.iter().all(|o| o.failure.is_some());
    let mut matches = Vec::new();
    let mut failures = Vec::new();
    let mut pages_fetched = 0;

    for outcome in outcomes {
        pages_fetched += outcome.pages_fetched;
        if let Some(reason) = outcome.failure {
            SearchMetrics::record_source_failure(&outcome.source_id);
            failures.push(SourceFailure {
                source_id: outcome.source_id,
                theater: outcome.theater,
                reason,
            });
        }
        matches.extend(outcome.matches);
    }

    SearchReport {
        movie: query.as_str().to_string(),
        matches,
        failures,
        sources_searched,
        pages_fetched,
        degraded,
        searched_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractionStrategy, NextPageRule, SourceDescriptor};
    use crate::test_support::FakeHttp;
    use std::time::Duration;

    fn source(id: &str, strategy: ExtractionStrategy) -> SourceDescriptor {
        SourceDescriptor {
            id: id.to_string(),
            display_name: format!("Kino {}", id.to_uppercase()),
            base_urls: vec![format!("http://{}.test", id)],
            page_template: "/programm?page={page}".to_string(),
            strategy,
            max_pages: 3,
            next_page: NextPageRule::default(),
            enabled: true,
            homepage: None,
            politeness: None,
        }
    }

    fn markup() -> ExtractionStrategy {
        ExtractionStrategy::Markup {
            title_selector: "div.movie-title".to_string(),
            showtime_selector: "div.showtime".to_string(),
        }
    }

    fn config(sources: Vec<SourceDescriptor>, concurrent: bool) -> Config {
        let mut config = Config::with_sources(sources);
        config.politeness = PolitenessPolicy::none();
        config.concurrent = concurrent;
        config
    }

    fn listing(title: &str, times: &str) -> String {
        format!(
            r#"<html><body><div class="movie-title">{}</div><div class="showtime">{}</div></body></html>"#,
            title, times
        )
    }

    #[tokio::test]
    async fn test_unreachable_source_does_not_hide_others() {
        let http = Arc::new(
            FakeHttp::new()
                .page("http://a.test/programm?page=1", listing("Pathaan", "18:00"))
                .page("http://c.test/programm?page=1", listing("PATHAAN", "21:00")),
        );
        let sources = vec![source("a", markup()), source("b", markup()), source("c", markup())];
        let aggregator = Aggregator::with_client(&config(sources, true), http).unwrap();
        let report = aggregator.search_report(&Query::new("pathaan").unwrap()).await;

        let theaters: Vec<_> = report.matches.iter().map(|m| m.theater.as_str()).collect();
        assert_eq!(theaters, vec!["Kino A", "Kino C"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source_id, "b");
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn test_priority_order_independent_of_completion_order() {
        let http = Arc::new(
            FakeHttp::new()
                .page("http://a.test/programm?page=1", listing("Dune", "1"))
                .page("http://b.test/programm?page=1", listing("Dune", "2"))
                .page("http://c.test/programm?page=1", listing("Dune", "3"))
                .delay("http://a.test", Duration::from_millis(150))
                .delay("http://b.test", Duration::from_millis(75)),
        );
        let sources = vec![source("a", markup()), source("b", markup()), source("c", markup())];
        let aggregator = Aggregator::with_client(&config(sources, true), http.clone()).unwrap();
        let matches = aggregator.search(&Query::new("dune").unwrap()).await;

        // c finishes first and a last, yet a stays first
        let times: Vec<_> = matches.iter().map(|m| m.times.clone().unwrap()).collect();
        assert_eq!(times, vec!["1", "2", "3"]);
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_sequential_mode_preserves_order() {
        let http = Arc::new(
            FakeHttp::new()
                .page("http://a.test/programm?page=1", listing("Dune", "1"))
                .page("http://b.test/programm?page=1", listing("Dune", "2")),
        );
        let sources = vec![source("a", markup()), source("b", markup())];
        let aggregator = Aggregator::with_client(&config(sources, false), http.clone()).unwrap();
        let matches = aggregator.search(&Query::new("dune").unwrap()).await;

        assert_eq!(matches.len(), 2);
        assert_eq!(
            http.requests(),
            vec!["http://a.test/programm?page=1", "http://b.test/programm?page=1"]
        );
    }

    #[tokio::test]
    async fn test_dune_end_to_end() {
        let http = Arc::new(
            FakeHttp::new()
                .page(
                    "http://a.test/programm?page=1",
                    listing("Dune: Part Two", "18:00, 21:00"),
                )
                .page(
                    "http://b.test/programm?page=1",
                    "<html><body><p>Barbie und Oppenheimer</p></body></html>".to_string(),
                ),
        );
        let sources = vec![source("a", markup()), source("b", ExtractionStrategy::FullText)];
        let aggregator = Aggregator::with_client(&config(sources, true), http).unwrap();
        let matches = aggregator.search(&Query::new("Dune").unwrap()).await;

        assert_eq!(
            matches,
            vec![Match {
                theater: "Kino A".to_string(),
                times: Some("18:00, 21:00".to_string()),
                link: "http://a.test/programm?page=1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_no_matching_content_is_empty_not_error() {
        let http = Arc::new(FakeHttp::new().fallback(listing("Barbie", "18:00")));
        let sources = vec![source("a", markup()), source("b", ExtractionStrategy::FullText)];
        let aggregator = Aggregator::with_client(&config(sources, true), http).unwrap();
        let report = aggregator
            .search_report(&Query::new("Nonexistent Film Title").unwrap())
            .await;

        assert!(report.is_empty());
        assert!(report.failures.is_empty());
        assert!(!report.degraded);
        assert_eq!(report.sources_searched, 2);
    }

    #[tokio::test]
    async fn test_every_source_failing_is_degraded() {
        let http = Arc::new(FakeHttp::new().status("http://a.test/programm?page=1", 503));
        let sources = vec![source("a", markup()), source("b", ExtractionStrategy::FullText)];
        let aggregator = Aggregator::with_client(&config(sources, true), http).unwrap();
        let report = aggregator.search_report(&Query::new("dune").unwrap()).await;

        assert!(report.is_empty());
        assert!(report.degraded);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.pages_fetched, 0);
    }

    #[tokio::test]
    async fn test_disabled_sources_are_skipped() {
        let mut b = source("b", markup());
        b.enabled = false;
        let http = Arc::new(FakeHttp::new().fallback(listing("Dune", "20:00")));
        let aggregator =
            Aggregator::with_client(&config(vec![source("a", markup()), b], true), http).unwrap();
        assert_eq!(aggregator.source_ids(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_source_politeness_overrides_global_delay() {
        let page = r#"<html><body><div class="movie-title">Dune</div><div class="showtime">18:00</div><a class="next">»</a></body></html>"#
            .to_string();
        let http = Arc::new(FakeHttp::new().fallback(page));
        let mut a = source("a", markup());
        a.politeness = Some(PolitenessPolicy::none());
        let mut b = source("b", markup());
        b.politeness = Some(PolitenessPolicy::none());

        for concurrent in [true, false] {
            let mut config = config(vec![a.clone(), b.clone()], concurrent);
            config.politeness = PolitenessPolicy::Fixed { delay_ms: 60_000 };
            let aggregator = Aggregator::with_client(&config, http.clone()).unwrap();
            let matches = tokio::time::timeout(
                Duration::from_secs(5),
                aggregator.search(&Query::new("dune").unwrap()),
            )
            .await
            .expect("per-source policy should replace the one-minute global delay");
            assert_eq!(matches.len(), 6);
        }
    }
}
