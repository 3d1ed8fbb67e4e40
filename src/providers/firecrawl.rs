//! Firecrawl scrape API.

use super::{check_response, http_client};
use crate::api::{ContentExtractor, ScrapeOptions};
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// Client timeout; above the 45 s server-side budget in [`ScrapeOptions`].
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct FirecrawlClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FirecrawlClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(REQUEST_TIMEOUT)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    #[serde(flatten)]
    options: &'a ScrapeOptions,
}

#[async_trait]
impl ContentExtractor for FirecrawlClient {
    /// Returns the `data` object of a successful response (holding `markdown`),
    /// or the whole body if there is none.
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> Result<serde_json::Value, ServiceError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ScrapeRequest { url, options })
            .send()
            .await?;
        let mut body = check_response(resp).await?;
        if body["success"] == serde_json::Value::Bool(false) {
            let message = body["error"].as_str().unwrap_or("scrape unsuccessful").to_string();
            return Err(ServiceError::Malformed(message));
        }
        if let Some(data) = body.get_mut("data") {
            return Ok(data.take());
        }
        Ok(body)
    }
}
