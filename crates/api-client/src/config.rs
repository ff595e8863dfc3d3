//! Configuration for the ChatAds API client
//!
//! Environment-based configuration with sensible defaults. The credential is
//! deliberately not part of [`ClientConfig`]: it is resolved per call via
//! [`resolve_api_key`] and installed on the cached client, so a config value
//! can be logged or serialized without ever carrying a secret.

use crate::quota::QuotaThresholds;
use chatads_core::retry::{CircuitBreakerConfig, RetryConfig};
use chatads_core::{ChatAdsError, ChatAdsResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default production API host
const DEFAULT_BASE_URL: &str = "https://api.getchatads.com";

/// Default message-send endpoint path
const DEFAULT_ENDPOINT: &str = "/v1/message/send";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "CHATADS_API_KEY";

/// Client configuration, immutable once a client is built from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the ChatAds API
    pub base_url: String,
    /// Message-send endpoint path, joined onto `base_url`
    pub endpoint: String,
    /// Per-attempt request timeout
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// Circuit breaker thresholds; `None` disables the breaker
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    /// Cutoffs for quota warnings attached to result metadata
    #[serde(default)]
    pub quota: QuotaThresholds,
}

mod timeout_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            circuit_breaker: Some(CircuitBreakerConfig::default()),
            quota: QuotaThresholds::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the following, falling back to defaults when unset or unparsable:
    /// - `CHATADS_BASE_URL`: API host
    /// - `CHATADS_TIMEOUT_SECS`: per-attempt timeout in seconds
    /// - `CHATADS_MAX_RETRIES`: maximum attempts per request
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("CHATADS_BASE_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Some(timeout) = env::var("CHATADS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(max_attempts) = env::var("CHATADS_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.retry.max_attempts = max_attempts;
        }

        config
    }

    /// Builder-style method to set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the endpoint path
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builder-style method to set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style method to set (or disable) the circuit breaker
    #[must_use]
    pub fn with_circuit_breaker(mut self, breaker: Option<CircuitBreakerConfig>) -> Self {
        self.circuit_breaker = breaker;
        self
    }

    /// Full URL of the message-send endpoint
    #[must_use]
    pub fn request_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `CONFIGURATION_ERROR` for an empty or non-HTTP base URL, a
    /// zero timeout, or a zero attempt budget.
    pub fn validate(&self) -> ChatAdsResult<()> {
        if self.base_url.is_empty() {
            return Err(ChatAdsError::configuration("base_url cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ChatAdsError::configuration(
                "base_url must start with http:// or https://",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ChatAdsError::configuration("timeout cannot be zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ChatAdsError::configuration(
                "retry.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Resolve the API key: an explicit override wins, otherwise the
/// `CHATADS_API_KEY` environment variable.
///
/// # Errors
///
/// Returns `CONFIGURATION_ERROR` when neither source yields a non-empty key;
/// absence is never papered over with a default.
pub fn resolve_api_key(explicit: Option<&str>) -> ChatAdsResult<String> {
    if let Some(key) = explicit {
        if !key.trim().is_empty() {
            return Ok(key.to_string());
        }
    }
    match env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ChatAdsError::configuration(
            "ChatAds API key is not set. Pass api_key or set the CHATADS_API_KEY environment variable.",
        )),
    }
}
