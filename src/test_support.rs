use crate::app::ports::HttpClientPort;
use crate::types::FetchResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory fetcher for unit tests. Unknown URLs fail like an
/// unreachable host unless a fallback body is set.
#[derive(Default)]
pub struct FakeHttp {
    responses: HashMap<String, FetchResult>,
    delays: Vec<(String, Duration)>,
    fallback: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: String) -> Self {
        self.responses
            .insert(url.to_string(), FetchResult::Ok { body });
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), FetchResult::HttpError { status });
        self
    }

    pub fn fallback(mut self, body: String) -> Self {
        self.fallback = Some(body);
        self
    }

    /// Delay every response whose URL starts with `prefix`.
    pub fn delay(mut self, prefix: &str, delay: Duration) -> Self {
        self.delays.push((prefix.to_string(), delay));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn fetch(&self, url: &str) -> FetchResult {
        self.requests.lock().unwrap().push(url.to_string());

        let delay = self
            .delays
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(result) = self.responses.get(url) {
            return result.clone();
        }
        match &self.fallback {
            Some(body) => FetchResult::Ok { body: body.clone() },
            None => FetchResult::NetworkError {
                message: format!("dns error: failed to lookup address for {}", url),
            },
        }
    }
}
