//! Runtime configuration.
//!
//! Two layers:
//! - [`Secrets`]: the two API keys, read from the environment after loading a
//!   local `.env` file. Both are required; a run fails before touching the
//!   browser if either is missing.
//! - [`PipelineConfig`]: optional YAML tuning file. Every field has a default,
//!   so an absent file (or a partial one) is fine.

use crate::error::ConfigError;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const FIRECRAWL_API_KEY: &str = "FIRECRAWL_API_KEY";
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

/// API keys for the two external services.
#[derive(Clone)]
pub struct Secrets {
    pub firecrawl_api_key: String,
    pub groq_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("firecrawl_api_key", &"<redacted>")
            .field("groq_api_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Load `.env` (if present) and read both keys from the process
    /// environment. Variable names match case-insensitively.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env"),
            Err(e) => debug!(error = %e, "No .env loaded"),
        }
        Self::from_vars(std::env::vars_os())
    }

    /// Build from raw environment pairs. Entries that are not valid UTF-8 are
    /// ignored, so a non-UTF-8 key value counts as missing.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars: Vec<(OsString, OsString)> = vars.into_iter().collect();
        Self::from_lookup(|name| {
            vars.iter()
                .find(|(k, _)| k.to_str().is_some_and(|k| k.eq_ignore_ascii_case(name)))
                .and_then(|(_, v)| v.clone().into_string().ok())
        })
    }

    /// Build from an arbitrary lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSecret(name))
        };
        Ok(Self {
            firecrawl_api_key: get(FIRECRAWL_API_KEY)?,
            groq_api_key: get(GROQ_API_KEY)?,
        })
    }
}

/// Spacing and retry knobs for one external service. A YAML table for it must
/// set all three fields.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ServiceLimits {
    /// Minimum seconds between consecutive calls.
    pub min_interval_secs: f64,
    /// Total attempts per item, including the first.
    pub max_attempts: u32,
    /// Backoff after the n-th throttled attempt is `n * backoff_base_secs`.
    pub backoff_base_secs: f64,
}

impl ServiceLimits {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.min_interval_secs.max(0.0))
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base_secs.max(0.0))
    }

    pub const FETCH: ServiceLimits = ServiceLimits {
        min_interval_secs: 2.0,
        max_attempts: 3,
        backoff_base_secs: 2.0,
    };

    pub const CLASSIFY: ServiceLimits = ServiceLimits {
        min_interval_secs: 1.0,
        max_attempts: 4,
        backoff_base_secs: 1.5,
    };
}

/// Tuning file contents.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub portal_url: String,
    pub webdriver_url: String,
    /// Hosts containing this marker are the search portal itself.
    pub portal_host_marker: String,
    /// URLs containing this marker are institutional-repository handle pages.
    pub repository_handle_marker: String,
    pub firecrawl_endpoint: String,
    pub groq_endpoint: String,
    pub model: String,
    pub fetch: ServiceLimits,
    pub classify: ServiceLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            portal_url: "https://scholar.ucc.edu.gh/publications".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            portal_host_marker: "scholar.google".to_string(),
            repository_handle_marker: "ir.ucc.edu.gh/xmlui/handle".to_string(),
            firecrawl_endpoint: "https://api.firecrawl.dev/v1/scrape".to_string(),
            groq_endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            fetch: ServiceLimits::FETCH,
            classify: ServiceLimits::CLASSIFY,
        }
    }
}

impl PipelineConfig {
    /// Load from `path` if given, else return defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// `Data/awardees_by_period/awardees_{period}.csv`
    pub fn awardees_file(&self, period: &str) -> PathBuf {
        self.data_dir
            .join("awardees_by_period")
            .join(format!("awardees_{period}.csv"))
    }

    /// Directory holding per-period artefacts.
    pub fn period_dir(&self, period: &str) -> PathBuf {
        self.data_dir.join(period)
    }

    /// Discovery output, classification input.
    pub fn raw_publications_file(&self, period: &str) -> PathBuf {
        self.period_dir(period).join("raw_publications.csv")
    }

    pub fn preprocessed_dir(&self, period: &str) -> PathBuf {
        self.period_dir(period).join("preprocessed_files")
    }

    /// Classification output.
    pub fn preprocessed_file(&self, period: &str) -> PathBuf {
        self.preprocessed_dir(period)
            .join(format!("rsg_{period}_preprocessed.csv"))
    }
}
