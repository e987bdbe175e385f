//! Metrics for the showtime search
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    FetchSuccess,
    FetchHttpError,
    FetchNetworkError,
    FetchDuration,
    FetchBytes,
    SearchesTotal,
    SearchesDegraded,
    SearchDuration,
    MatchesFound,
    SourceFailures,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::FetchSuccess => "showtime_fetch_success_total",
            MetricName::FetchHttpError => "showtime_fetch_http_error_total",
            MetricName::FetchNetworkError => "showtime_fetch_network_error_total",
            MetricName::FetchDuration => "showtime_fetch_duration_seconds",
            MetricName::FetchBytes => "showtime_fetch_bytes",
            MetricName::SearchesTotal => "showtime_searches_total",
            MetricName::SearchesDegraded => "showtime_searches_degraded_total",
            MetricName::SearchDuration => "showtime_search_duration_seconds",
            MetricName::MatchesFound => "showtime_matches_found_total",
            MetricName::SourceFailures => "showtime_source_failures_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Page request metrics
pub struct FetchMetrics;

impl FetchMetrics {
    pub fn record_success(duration_secs: f64, payload_bytes: usize) {
        ::metrics::counter!(MetricName::FetchSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::FetchDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::FetchBytes.as_str()).record(payload_bytes as f64);
    }

    pub fn record_http_error(status: u16) {
        ::metrics::counter!(MetricName::FetchHttpError.as_str(), "status" => status.to_string())
            .increment(1);
    }

    pub fn record_network_error() {
        ::metrics::counter!(MetricName::FetchNetworkError.as_str()).increment(1);
    }
}

/// Whole-search metrics
pub struct SearchMetrics;

impl SearchMetrics {
    pub fn record_search(duration_secs: f64, matches: usize, degraded: bool) {
        ::metrics::counter!(MetricName::SearchesTotal.as_str()).increment(1);
        ::metrics::histogram!(MetricName::SearchDuration.as_str()).record(duration_secs);
        ::metrics::counter!(MetricName::MatchesFound.as_str()).increment(matches as u64);
        if degraded {
            ::metrics::counter!(MetricName::SearchesDegraded.as_str()).increment(1);
        }
    }

    pub fn record_source_failure(source_id: &str) {
        ::metrics::counter!(MetricName::SourceFailures.as_str(), "source" => source_id.to_string())
            .increment(1);
    }
}

/// Install the Prometheus recorder; the handle renders the scrape body.
pub fn init() -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    info!("Metrics system initialized");
    Ok(handle)
}
