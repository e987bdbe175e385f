use crate::app::ports::HttpClientPort;
use crate::config::Config;
use crate::error::ScraperError;
use crate::infra::http_client::ReqwestHttp;
use crate::pipeline::Aggregator;
use crate::types::{Match, Query, SourceFailure};
use axum::{
    extract::Extension,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub struct AppState {
    pub config: Config,
    pub http: Arc<dyn HttpClientPort>,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub movie: String,
    /// Restrict to these source ids; all enabled sources when empty.
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub movie: String,
    pub results: Vec<Match>,
    pub degraded: bool,
    pub failures: Vec<SourceFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub theater: String,
    pub homepage: String,
    pub strategy: &'static str,
    pub locations: usize,
}

fn error_response(status: StatusCode, err: &ScraperError) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": err.code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "showtime-finder",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_sources(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let sources: Vec<SourceSummary> = state
        .config
        .enabled_sources()
        .map(|s| SourceSummary {
            id: s.id.clone(),
            theater: s.display_name.clone(),
            homepage: s.canonical_link().to_string(),
            strategy: s.strategy.label(),
            locations: s.base_urls.len(),
        })
        .collect();
    Json(sources)
}

async fn search(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Response {
    let query = match Query::new(&req.movie) {
        Ok(q) => q,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };
    let config = match state.config.restricted_to(&req.sources) {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };
    let aggregator = match Aggregator::with_client(&config, state.http.clone()) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to build aggregator: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e);
        }
    };

    let report = aggregator.search_report(&query).await;
    let message = report
        .is_empty()
        .then(|| format!("No showtimes found for \"{}\"", report.movie));
    Json(SearchResponse {
        movie: report.movie,
        results: report.matches,
        degraded: report.degraded,
        failures: report.failures,
        message,
    })
    .into_response()
}

async fn render_metrics(Extension(state): Extension<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Create the HTTP router
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sources", get(list_sources))
        .route("/search", post(search))
        .route("/metrics", get(render_metrics))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    config: Config,
    metrics: Option<PrometheusHandle>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let http = Arc::new(ReqwestHttp::from_config(&config)?);
    let app = create_server(Arc::new(AppState {
        config,
        http,
        metrics,
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "HTTP server listening");
    println!("🎬 Showtime finder running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("🔎 Search:       POST http://localhost:{port}/search");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
