//! Article text retrieval through the content-extraction service.
//!
//! A [`FetchSession`] owns the URL cache and the service's call spacing for
//! one run. Failures are cached as empty text, so a URL is never requested
//! twice in a run, whatever the outcome.

use crate::api::{ContentExtractor, ScrapeOptions, Throttle};
use crate::config::ServiceLimits;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Pull article text out of an extraction response.
///
/// Objects yield their `markdown` field, else `text`, else nothing. Bare
/// strings are used as is; anything else is rendered as JSON text.
pub fn extract_text(body: &serde_json::Value) -> String {
    match body {
        serde_json::Value::Object(map) => ["markdown", "text"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Content-extraction state for one run: the service client, its call
/// spacing, and the URL cache.
pub struct FetchSession {
    extractor: Box<dyn ContentExtractor>,
    throttle: Throttle,
    cache: HashMap<String, String>,
}

impl FetchSession {
    pub fn new(extractor: Box<dyn ContentExtractor>, limits: ServiceLimits) -> Self {
        Self {
            extractor,
            throttle: Throttle::new("content-extraction", limits),
            cache: HashMap::new(),
        }
    }

    /// Article text for `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - Resolved article URL; PDFs (by extension) skip the script wait
    ///
    /// # Returns
    ///
    /// The extracted text, or an empty string when the service failed, gave
    /// up after throttling retries, or returned nothing usable. Either outcome
    /// is cached, so the service sees each URL at most once per session.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch(&mut self, url: &str) -> String {
        if let Some(text) = self.cache.get(url) {
            debug!(chars = text.len(), "Content cache hit");
            return text.clone();
        }

        let extractor = self.extractor.as_ref();
        let options = &ScrapeOptions::for_url(url);
        let text = match self.throttle.run(move || extractor.scrape(url, options)).await {
            Ok(body) => {
                let text = extract_text(&body);
                info!(chars = text.len(), "Content fetched");
                text
            }
            Err(e) => {
                warn!(error = %e, "Giving up on content");
                String::new()
            }
        };

        self.cache.insert(url.to_string(), text.clone());
        text
    }

    /// Number of cached URLs, failures included.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
