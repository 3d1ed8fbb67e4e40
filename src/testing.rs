//! Counting fakes for the external services.

use crate::api::{ChatModel, ContentExtractor, ScrapeOptions};
use crate::error::ServiceError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) type Calls = Arc<AtomicUsize>;

pub(crate) fn count(calls: &Calls) -> usize {
    calls.load(Ordering::SeqCst)
}

/// Serves fixed bodies per URL; unknown URLs get a 404.
pub(crate) struct FakeExtractor {
    pub pages: HashMap<String, serde_json::Value>,
    /// Errors handed out before falling back to `pages`.
    pub failures: Mutex<VecDeque<ServiceError>>,
    pub calls: Calls,
}

impl FakeExtractor {
    pub fn new(pages: &[(&str, serde_json::Value)]) -> (Self, Calls) {
        let calls = Calls::default();
        let fake = Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.clone()))
                .collect(),
            failures: Mutex::new(VecDeque::new()),
            calls: calls.clone(),
        };
        (fake, calls)
    }

    pub fn failing_first(self, failures: Vec<ServiceError>) -> Self {
        *self.failures.lock().unwrap() = failures.into();
        self
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn scrape(&self, url: &str, _options: &ScrapeOptions) -> Result<serde_json::Value, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        self.pages.get(url).cloned().ok_or(ServiceError::Http {
            status: 404,
            message: format!("no such page {url}"),
        })
    }
}

/// Answers with `reply`, after handing out any queued failures.
pub(crate) struct FakeModel {
    pub reply: String,
    pub failures: Mutex<VecDeque<ServiceError>>,
    pub calls: Calls,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeModel {
    pub fn new(reply: &str) -> (Self, Calls) {
        let calls = Calls::default();
        let fake = Self {
            reply: reply.to_string(),
            failures: Mutex::new(VecDeque::new()),
            calls: calls.clone(),
            prompts: Arc::default(),
        };
        (fake, calls)
    }

    pub fn failing_first(self, failures: Vec<ServiceError>) -> Self {
        *self.failures.lock().unwrap() = failures.into();
        self
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn ask(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(e) = self.failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(self.reply.clone())
    }
}
