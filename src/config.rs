//! Configuration types for qualtrics-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when `ApiConfig::api_token` is unset
pub const API_TOKEN_ENV: &str = "QUALTRICS_API_TOKEN";

/// API endpoint and credential configuration
///
/// Credentials are never embedded in source; supply the token here or via
/// the `QUALTRICS_API_TOKEN` environment variable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Data center subdomain, e.g. "syd1" or "fra1" (default: "syd1")
    #[serde(default = "default_data_center")]
    pub data_center: String,

    /// Full API root override, e.g. "http://localhost:8080"
    ///
    /// When set, replaces the `https://{data_center}.qualtrics.com/API/v3`
    /// root entirely. Intended for proxies and test servers.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API token; falls back to the `QUALTRICS_API_TOKEN` environment
    /// variable when `None`
    #[serde(default)]
    pub api_token: Option<String>,

    /// XM directory id, required only for directory-scoped endpoints
    #[serde(default)]
    pub directory_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            data_center: default_data_center(),
            base_url: None,
            api_token: None,
            directory_id: None,
        }
    }
}

/// Export pipeline behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Delay between status polls (default: 2 seconds)
    ///
    /// Each poll iteration issues exactly one network call; this delay
    /// keeps the loop from busy-polling the status endpoint.
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Overall deadline for a single submit-poll-download pipeline
    /// (None = no deadline; default: 15 minutes)
    #[serde(default = "default_poll_deadline", with = "option_duration_serde")]
    pub poll_deadline: Option<Duration>,

    /// Maximum export pipelines running concurrently (default: 1,
    /// strictly sequential)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_exports: usize,

    /// Per-request timeout applied to every API call (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            poll_deadline: default_poll_deadline(),
            max_concurrent_exports: default_max_concurrent(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry configuration for transient failures
///
/// Retries wrap the whole submit-then-poll sequence; the poll loop itself
/// never retries a classified error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each attempt (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays to prevent thundering herd (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for the export client and pipeline
///
/// Constructed once per process invocation and passed in explicitly; there
/// is no ambient global state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint and credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Pipeline behavior (polling cadence, deadline, concurrency)
    #[serde(default)]
    pub export: ExportConfig,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Validate settings that serde defaults cannot guarantee
    pub fn validate(&self) -> Result<()> {
        if self.api.data_center.is_empty() {
            return Err(Error::Config {
                message: "data_center must not be empty".into(),
                key: Some("api.data_center".into()),
            });
        }
        if self.export.max_concurrent_exports == 0 {
            return Err(Error::Config {
                message: "max_concurrent_exports must be at least 1".into(),
                key: Some("export.max_concurrent_exports".into()),
            });
        }
        if self.export.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll_interval must be non-zero to avoid busy-polling".into(),
                key: Some("export.poll_interval".into()),
            });
        }
        Ok(())
    }
}

fn default_data_center() -> String {
    "syd1".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_deadline() -> Option<Duration> {
    Some(Duration::from_secs(15 * 60))
}

fn default_max_concurrent() -> usize {
    1
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

/// Serialize Durations as whole seconds for config files
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serialize optional Durations as whole seconds for config files
mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
