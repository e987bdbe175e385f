use crate::app::ports::HttpClientPort;
use crate::config::Config;
use crate::error::Result;
use crate::observability::metrics::FetchMetrics;
use crate::types::FetchResult;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// reqwest-backed fetcher sending a browser User-Agent
pub struct ReqwestHttp {
    client: reqwest::Client,
    user_agent: String,
}

impl ReqwestHttp {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> FetchResult {
        let started = Instant::now();
        let resp = match self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Request failed: {}", e);
                FetchMetrics::record_network_error();
                return FetchResult::NetworkError {
                    message: e.to_string(),
                };
            }
        };

        let status = resp.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Unexpected response status");
            FetchMetrics::record_http_error(status.as_u16());
            return FetchResult::HttpError {
                status: status.as_u16(),
            };
        }

        // A body cut off mid-transfer is a transport problem, not a page.
        match resp.text().await {
            Ok(body) => {
                let elapsed = started.elapsed().as_secs_f64();
                debug!(bytes = body.len(), elapsed, "Fetched page");
                FetchMetrics::record_success(elapsed, body.len());
                FetchResult::Ok { body }
            }
            Err(e) => {
                warn!("Failed reading response body: {}", e);
                FetchMetrics::record_network_error();
                FetchResult::NetworkError {
                    message: e.to_string(),
                }
            }
        }
    }
}
