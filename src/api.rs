//! External service seams with throttling-aware retry.
//!
//! # Architecture
//!
//! - [`ContentExtractor`]: turns a URL into extracted article content
//! - [`ChatModel`]: sends one prompt to a language model, returns its reply
//! - [`Throttle`]: per-service call spacing plus linear backoff on throttling
//!
//! Production implementations live in [`crate::providers`]; tests plug in
//! counting fakes.
//!
//! # Retry Strategy
//!
//! - Consecutive calls to one service are spaced at least `min_interval` apart
//!   (tracked per [`Throttle`], so one per service and per session)
//! - Throttling errors (see [`ServiceError::is_throttling`]) are retried after
//!   `attempt * backoff_base`, up to `max_attempts` calls in total
//! - Any other error stops immediately

use crate::config::ServiceLimits;
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, warn};

/// Scrape options sent with every content-extraction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptions {
    pub formats: Vec<String>,
    /// Server-side timeout in milliseconds.
    pub timeout: u64,
    pub block_ads: bool,
    pub proxy: String,
    /// Milliseconds to let page scripts run before extracting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<u64>,
}

impl ScrapeOptions {
    /// Markdown output with a 45 s budget; non-PDF pages get a short 500 ms
    /// script wait.
    pub fn for_url(url: &str) -> Self {
        let is_pdf = url.to_lowercase().ends_with(".pdf");
        Self {
            formats: vec!["markdown".to_string()],
            timeout: 45_000,
            block_ads: false,
            proxy: "stealth".to_string(),
            wait_for: (!is_pdf).then_some(500),
        }
    }
}

/// Content-extraction service.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Return the raw response body for `url`.
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> Result<serde_json::Value, ServiceError>;
}

/// Language-model service.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text.
    async fn ask(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Call spacing and throttling retry for one service.
#[derive(Debug)]
pub struct Throttle {
    service: &'static str,
    min_interval: Duration,
    max_attempts: u32,
    backoff_base: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    /// Create a throttle for `service` (used only as a log field).
    ///
    /// `limits.max_attempts` is raised to at least 1.
    pub fn new(service: &'static str, limits: ServiceLimits) -> Self {
        Self {
            service,
            min_interval: limits.min_interval(),
            max_attempts: limits.max_attempts.max(1),
            backoff_base: limits.backoff_base(),
            last_call: None,
        }
    }

    /// Delay after the `attempt`-th throttled call (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    async fn space_out(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(service = self.service, ?wait, "Spacing out call");
                sleep(wait).await;
            }
        }
        self.last_call = Some(Instant::now());
    }

    /// Run `call` under the spacing and retry policy.
    ///
    /// # Arguments
    ///
    /// * `call` - Builds one request future per attempt
    ///
    /// # Returns
    ///
    /// The first successful value.
    ///
    /// # Errors
    ///
    /// The last [`ServiceError`] once `max_attempts` throttled calls have
    /// failed, or the first non-throttling error immediately. Errors are
    /// logged here; callers only decide the fallback value.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut throttle = Throttle::new("language-model", ServiceLimits::CLASSIFY);
    /// let reply = throttle.run(|| model.ask(&prompt)).await?;
    /// ```
    pub async fn run<T, F, Fut>(&mut self, mut call: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt = 1;
        loop {
            self.space_out().await;
            debug!(service = self.service, attempt, "Calling service");
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_throttling() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        service = self.service,
                        attempt,
                        max = self.max_attempts,
                        ?delay,
                        error = %e,
                        "Rate limited; backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_throttling() => {
                    error!(service = self.service, attempts = attempt, error = %e, "Rate limited; retries exhausted");
                    return Err(e);
                }
                Err(e) => {
                    error!(service = self.service, error = %e, "Service call failed");
                    return Err(e);
                }
            }
        }
    }
}
