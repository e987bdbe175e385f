use crate::app::ports::PolitenessPort;
use crate::config::PolitenessPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Unconditional sleep between pages.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PolitenessPort for FixedDelay {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Requests-per-minute token bucket, refilled continuously.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    // tokens available and the time of the last refill
    state: Mutex<(f64, Instant)>,
}

impl TokenBucket {
    pub fn new(requests_per_min: u64) -> Self {
        let capacity = requests_per_min as f64;
        Self {
            capacity,
            state: Mutex::new((capacity, Instant::now())),
        }
    }

    async fn consume(&self) {
        if self.capacity <= 0.0 {
            return;
        }
        let refill_rate = self.capacity / 60.0; // tokens per second
        loop {
            let mut guard = self.state.lock().await;
            let (ref mut tokens, ref mut last) = *guard;
            let now = Instant::now();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *tokens = (*tokens + elapsed * refill_rate).min(self.capacity);
            *last = now;
            if *tokens >= 1.0 {
                *tokens -= 1.0;
                break;
            }
            let secs = (1.0 - *tokens) / refill_rate;
            drop(guard);
            tokio::time::sleep(Duration::from_secs_f64(secs.max(0.001))).await;
        }
    }
}

#[async_trait]
impl PolitenessPort for TokenBucket {
    async fn pause(&self) {
        self.consume().await;
    }
}

pub fn politeness_for(policy: &PolitenessPolicy) -> Arc<dyn PolitenessPort> {
    match policy {
        PolitenessPolicy::Fixed { delay_ms } => {
            Arc::new(FixedDelay::new(Duration::from_millis(*delay_ms)))
        }
        PolitenessPolicy::TokenBucket { requests_per_min } => {
            Arc::new(TokenBucket::new(*requests_per_min))
        }
    }
}
