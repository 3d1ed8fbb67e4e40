//! Error types shared across the crate.
//!
//! The pipeline distinguishes between errors that abort a whole run
//! (configuration, period parsing, missing input files) and errors that are
//! absorbed at the row level (browser lookups and external service calls).
//! The latter still get typed variants so callers can log them precisely.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Crate-level error returned by the `run` entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Problems with secrets or the optional YAML tuning file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set (environment or .env)")]
    MissingSecret(&'static str),
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The period string carried no 4-digit year.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot determine year(s) from period string '{0}'; use YYYY or YYYY-YYYY")]
pub struct PeriodError(pub String);

/// Input CSV problems.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),
    #[error("{path} has no awardee column")]
    NoAwardeeColumn { path: PathBuf },
    #[error("could not read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Failures raised by a browser page. Always recoverable at the row level.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("could not start browser session: {0}")]
    Session(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("timed out after {timeout:?} waiting for {selector}")]
    Timeout { selector: String, timeout: Duration },
    #[error("no element matches {0}")]
    NoElement(String),
    #[error("browser command failed: {0}")]
    Command(String),
}

/// Failures from the content-extraction or language-model service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// True for errors that should be retried with backoff: HTTP 429, or any
    /// message mentioning "429" or "rate limit".
    pub fn is_throttling(&self) -> bool {
        if let ServiceError::Http { status: 429, .. } = self {
            return true;
        }
        let msg = self.to_string().to_lowercase();
        msg.contains("429") || msg.contains("rate limit")
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ServiceError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => ServiceError::Transport(e.to_string()),
        }
    }
}
