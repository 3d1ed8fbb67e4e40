//! HTTP clients for the two external services.
//!
//! - [`firecrawl::FirecrawlClient`] implements [`ContentExtractor`](crate::api::ContentExtractor)
//! - [`groq::GroqClient`] implements [`ChatModel`](crate::api::ChatModel)

pub mod firecrawl;
pub mod groq;

use crate::error::ServiceError;
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::Transport(e.to_string()))
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    json["error"]["message"]
        .as_str()
        .or_else(|| json["error"].as_str())
        .or_else(|| json["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map HTTP >= 400 to [`ServiceError::Http`], otherwise parse the JSON body.
pub(crate) async fn check_response(resp: reqwest::Response) -> Result<serde_json::Value, ServiceError> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    if status >= 400 {
        return Err(ServiceError::Http {
            status,
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
}
