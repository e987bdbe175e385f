use crate::types::FetchResult;
use async_trait::async_trait;

/// Single GET per call; network and status problems come back as values.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// Waits out the gap between two page requests to the same origin.
#[async_trait]
pub trait PolitenessPort: Send + Sync {
    async fn pause(&self);
}
