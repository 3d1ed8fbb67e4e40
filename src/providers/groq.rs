//! Groq chat completions (OpenAI-compatible).

use super::{check_response, http_client};
use crate::api::ChatModel;
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(REQUEST_TIMEOUT)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

/// `choices[0].message.content` of an OpenAI-style completion.
fn reply_text(body: &serde_json::Value) -> Result<String, ServiceError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ServiceError::Malformed("completion has no message content".to_string()))
}

#[async_trait]
impl ChatModel for GroqClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model, chars = prompt.len()))]
    async fn ask(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body = check_response(resp).await?;
        reply_text(&body)
    }
}
