//! Message-send orchestration
//!
//! Sequences the full pipeline for one affiliate-matching call: resolve the
//! credential, validate inputs, build the wire payload, fetch through the
//! cached resilient client, normalize the envelope, and attach quota
//! warnings. Every failure along the way folds into the same normalized
//! result shape; this function never returns an error value.

use crate::client::{ChatAdsClient, Transport};
use crate::config::{resolve_api_key, ClientConfig};
use crate::envelope::{normalize, MatchResult};
use crate::payload::WirePayload;
use crate::quota::check_warnings;
use crate::registry::ClientRegistry;
use chatads_core::validation::validate_inputs;
use chatads_core::ChatAdsError;
use std::time::Instant;
use tracing::instrument;

/// Caller arguments for one affiliate-matching call
#[derive(Debug, Clone, Default)]
pub struct MessageParams {
    /// The conversational message to match against
    pub message: String,
    /// Caller IP for geo-targeting
    pub ip: Option<String>,
    /// Caller device user agent
    pub user_agent: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country: Option<String>,
    /// ISO 639-1 language code
    pub language: Option<String>,
    /// Explicit credential, overriding the environment
    pub api_key: Option<String>,
}

impl MessageParams {
    /// Parameters carrying only the message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Builder-style method to set the caller IP
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builder-style method to set the country code
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Builder-style method to set the language code
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builder-style method to set an explicit API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Send a message for affiliate matching using environment configuration.
///
/// Never fails: validation, configuration, and upstream problems all come
/// back as a [`MatchResult`] with `status = error`.
pub async fn send_message(params: MessageParams) -> MatchResult {
    send_message_with_config(params, &ClientConfig::from_env()).await
}

/// Send a message for affiliate matching with an explicit configuration.
#[instrument(skip_all)]
pub async fn send_message_with_config(params: MessageParams, config: &ClientConfig) -> MatchResult {
    let started = Instant::now();

    let api_key = match resolve_api_key(params.api_key.as_deref()) {
        Ok(key) => key,
        Err(err) => return error_result(err, None, started),
    };

    if let Err(err) = validate_inputs(
        &params.message,
        params.ip.as_deref(),
        params.country.as_deref(),
        params.language.as_deref(),
        &api_key,
    ) {
        return error_result(err, Some(&api_key), started);
    }

    let client = match ClientRegistry::shared().get_or_create(&api_key, config) {
        Ok(client) => client,
        Err(err) => return error_result(err, Some(&api_key), started),
    };

    execute_send(client.as_ref(), &params, &api_key).await
}

/// Fetch and normalize against an already-built client.
///
/// Inputs are assumed validated. Split out so tests can drive the pipeline
/// over a scripted transport.
pub(crate) async fn execute_send<T: Transport>(
    client: &ChatAdsClient<T>,
    params: &MessageParams,
    api_key: &str,
) -> MatchResult {
    let started = Instant::now();
    let payload = WirePayload::from_params(params);
    let source_url = client.config().request_url();

    match client.fetch(&payload).await {
        Ok(response) => {
            let mut result = normalize(
                &response.body,
                response.status_code,
                response.latency_ms,
                &source_url,
            );
            if let Some(usage) = &result.metadata.usage_summary {
                result.metadata.notes = check_warnings(usage, &client.config().quota);
            }
            result
        }
        Err(err) => error_result(err, Some(api_key), started),
    }
}

/// Fold a pipeline error into the normalized error shape, scrubbing any
/// credential material from its message first.
fn error_result(error: ChatAdsError, api_key: Option<&str>, started: Instant) -> MatchResult {
    let error = error.sanitized(api_key);
    MatchResult::from_error(&error, started.elapsed().as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResultStatus;
    use crate::testing::{matched_envelope, no_match_envelope, MockTransport, Scripted};
    use chatads_core::error::REDACTED_ERROR;
    use chatads_core::retry::RetryConfig;
    use serde_json::json;

    const KEY: &str = "mock_api_key_test1234567890abcdef";

    fn mock_client(script: Vec<Scripted>) -> ChatAdsClient<MockTransport> {
        let config = ClientConfig::default()
            .with_base_url("https://api.test")
            .with_retry(RetryConfig {
                max_attempts: 3,
                backoff_base: std::time::Duration::from_millis(500),
                max_delay: std::time::Duration::from_secs(30),
            });
        ChatAdsClient::with_transport(MockTransport::new(script), config)
    }

    #[test]
    fn test_params_builder() {
        let params = MessageParams::new("best running shoes")
            .with_ip("8.8.8.8")
            .with_user_agent("Mozilla/5.0")
            .with_country("US")
            .with_language("en")
            .with_api_key(KEY);
        assert_eq!(params.message, "best running shoes");
        assert_eq!(params.ip.as_deref(), Some("8.8.8.8"));
        assert_eq!(params.api_key.as_deref(), Some(KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_match_end_to_end() {
        let client = mock_client(vec![Scripted::Status(200, matched_envelope("req_abc123"))]);
        let params = MessageParams::new("best laptop for coding");

        let result = execute_send(&client, &params, KEY).await;

        assert_eq!(result.status, ResultStatus::Success);
        assert!(result.matched);
        assert_eq!(result.product.as_deref(), Some("MacBook Pro M3"));
        assert_eq!(
            result.affiliate_link.as_deref(),
            Some("https://amazon.com/macbook-pro")
        );
        assert_eq!(result.metadata.request_id, "req_abc123");
        // Healthy usage figures produce no warning notes.
        assert!(result.metadata.usage_summary.is_some());
        assert!(result.metadata.notes.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match_end_to_end() {
        let client = mock_client(vec![Scripted::Status(200, no_match_envelope("req_xyz789"))]);
        let params = MessageParams::new("random text here");

        let result = execute_send(&client, &params, KEY).await;

        assert_eq!(result.status, ResultStatus::NoMatch);
        assert!(!result.matched);
        assert_eq!(
            result.reason.as_deref(),
            Some("No match: insufficient context")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exceeded_end_to_end() {
        let body = json!({
            "success": false,
            "error": { "code": "QUOTA_EXCEEDED", "message": "Monthly quota reached" },
            "meta": { "request_id": "req_quota123" },
        });
        let client = mock_client(vec![Scripted::Status(429, body)]);
        let params = MessageParams::new("best laptop deals");

        let result = execute_send(&client, &params, KEY).await;

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.error_code.as_deref(), Some("QUOTA_EXCEEDED"));
        assert!(result.error_message.unwrap().contains("Monthly quota"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_timeouts_then_success_makes_three_attempts() {
        let client = mock_client(vec![
            Scripted::Timeout,
            Scripted::Timeout,
            Scripted::Status(200, no_match_envelope("req_retry")),
        ]);
        let params = MessageParams::new("test message");

        let result = execute_send(&client, &params, KEY).await;

        assert_eq!(result.status, ResultStatus::NoMatch);
        assert_eq!(client.transport().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_unavailable() {
        let client = mock_client(vec![Scripted::Timeout, Scripted::Connect, Scripted::Timeout]);
        let params = MessageParams::new("test message");

        let result = execute_send(&client, &params, KEY).await;

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.error_code.as_deref(), Some("UPSTREAM_UNAVAILABLE"));
        assert_eq!(result.metadata.status_code, 503);
        assert_eq!(client.transport().calls(), 3);
    }

    #[tokio::test]
    async fn test_validation_error_makes_no_network_call() {
        // Unroutable address: any attempted connection would fail as
        // UPSTREAM_UNAVAILABLE instead of the expected validation error.
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:1");
        let key = "mock_api_key_validation_path_only";
        let params = MessageParams::new("laptop").with_api_key(key);

        let result = send_message_with_config(params, &config).await;

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.error_code.as_deref(), Some("MESSAGE_TOO_SHORT"));
        // Validation failed before a client was ever built for this key.
        assert!(!ClientRegistry::shared().contains(key));
    }

    #[tokio::test]
    async fn test_invalid_country_fails_before_network() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:1");
        let params = MessageParams::new("best laptop for coding")
            .with_country("USA")
            .with_api_key("mock_api_key_country_path_only");

        let result = send_message_with_config(params, &config).await;

        assert_eq!(result.error_code.as_deref(), Some("INVALID_INPUT"));
        assert!(result.error_message.unwrap().contains("ISO 3166-1"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        unsafe {
            std::env::remove_var(crate::config::API_KEY_ENV);
        }
        let result = send_message(MessageParams::new("test message")).await;

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.error_code.as_deref(), Some("CONFIGURATION_ERROR"));
        assert!(result.error_message.unwrap().contains("API key"));
    }

    #[test]
    fn test_error_result_scrubs_credential() {
        let leaky = ChatAdsError::upstream_unavailable(format!("refused for key {KEY}"));
        let result = error_result(leaky, Some(KEY), Instant::now());
        assert_eq!(result.error_message.as_deref(), Some(REDACTED_ERROR));
    }
}
