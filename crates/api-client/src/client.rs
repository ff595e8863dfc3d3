//! Resilient HTTP client for the ChatAds API
//!
//! Wraps a pooled `reqwest` client and adds:
//! - Circuit breaker gating to fail fast during outages
//! - Bounded retries with exponential backoff for transient failures
//! - Per-attempt timeouts and latency measurement
//! - Request correlation IDs for tracing
//!
//! The wire itself sits behind the [`Transport`] trait so tests can script
//! exact failure sequences; [`HttpTransport`] is the production
//! implementation.

use crate::config::ClientConfig;
use crate::payload::WirePayload;
use chatads_core::error::{sanitize_error_text, ChatAdsError, ChatAdsResult};
use chatads_core::retry::{CircuitBreaker, CircuitState};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Header carrying the credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Status and parsed body of a single upstream POST
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when the body was not valid JSON
    pub body: Value,
}

/// Transport-level failure of a single attempt
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The attempt exceeded the configured timeout
    Timeout,
    /// The connection could not be established
    Connect(String),
    /// Any other transport fault; not retryable
    Other(String),
}

impl TransportError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_))
    }

    fn describe(&self) -> String {
        match self {
            Self::Timeout => "request timed out".to_string(),
            Self::Connect(detail) => format!("connection failed: {detail}"),
            Self::Other(detail) => format!("request failed: {detail}"),
        }
    }
}

/// Seam between the retry loop and the wire
pub trait Transport: Send + Sync {
    /// POST the payload to the given URL and parse the JSON response
    fn post(
        &self,
        url: &str,
        request_id: &str,
        payload: &WirePayload,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Production transport over a pooled `reqwest` client.
///
/// The credential is installed as a sensitive default header at construction
/// and never appears in the request body.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    fn new(api_key: &str, config: &ClientConfig) -> ChatAdsResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut key_value = HeaderValue::from_str(api_key).map_err(|_| {
            ChatAdsError::configuration("API key contains characters that cannot travel in a header")
        })?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ChatAdsError::configuration(sanitize_error_text(&e.to_string(), Some(api_key)))
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        request_id: &str,
        payload: &WirePayload,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(X_REQUEST_ID, request_id)
            .json(payload)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        // A non-JSON body falls through to the normalizer's fallback shape.
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(TransportResponse { status, body })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Raw outcome of a fetch, before envelope normalization
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Parsed JSON body
    pub body: Value,
    /// HTTP status code
    pub status_code: u16,
    /// Wall-clock latency of the successful attempt, in milliseconds
    pub latency_ms: f64,
}

/// ChatAds HTTP client with built-in resilience patterns
///
/// One instance per credential; shared across concurrent requests. The only
/// state mutated after construction is the circuit breaker, which is
/// internally synchronized.
pub struct ChatAdsClient<T: Transport = HttpTransport> {
    transport: T,
    config: Arc<ClientConfig>,
    breaker: Option<Arc<CircuitBreaker>>,
    credential: Option<String>,
}

impl<T: Transport> std::fmt::Debug for ChatAdsClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAdsClient")
            .field("config", &self.config)
            .field("breaker", &self.breaker.is_some())
            .field("credential_set", &self.credential.is_some())
            .finish()
    }
}

impl ChatAdsClient<HttpTransport> {
    /// Create a client for the given credential.
    ///
    /// # Errors
    ///
    /// Returns `CONFIGURATION_ERROR` when the config fails validation, the
    /// key is empty, or the underlying HTTP client cannot be built.
    pub fn new(api_key: &str, config: ClientConfig) -> ChatAdsResult<Self> {
        config.validate()?;
        if api_key.trim().is_empty() {
            return Err(ChatAdsError::configuration(
                "ChatAds API key is not set. Pass api_key or set the CHATADS_API_KEY environment variable.",
            ));
        }
        let transport = HttpTransport::new(api_key, &config)?;
        let mut client = Self::with_transport(transport, config);
        client.credential = Some(api_key.to_string());
        Ok(client)
    }
}

impl<T: Transport> ChatAdsClient<T> {
    /// Create a client over a custom transport (primarily for tests)
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let breaker = config
            .circuit_breaker
            .clone()
            .map(|breaker_config| Arc::new(CircuitBreaker::new(breaker_config)));
        Self {
            transport,
            config: Arc::new(config),
            breaker,
            credential: None,
        }
    }

    /// The configuration this client was built from
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current circuit breaker state, if a breaker is enabled
    #[must_use]
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.breaker.as_ref().map(|breaker| breaker.state())
    }

    /// Breaker state as a wire label; `"disabled"` when no breaker is set
    #[must_use]
    pub fn circuit_state_label(&self) -> &'static str {
        self.breaker
            .as_ref()
            .map_or("disabled", |breaker| breaker.state().as_str())
    }

    /// Whether the breaker currently admits a call (true when disabled).
    ///
    /// An open breaker whose cooldown has elapsed transitions to half-open
    /// as part of this check.
    #[must_use]
    pub fn circuit_available(&self) -> bool {
        self.breaker
            .as_ref()
            .is_none_or(|breaker| breaker.is_available())
    }

    /// Reset the circuit breaker to closed
    pub fn reset_circuit(&self) {
        if let Some(breaker) = &self.breaker {
            breaker.reset();
        }
    }

    #[cfg(test)]
    pub(crate) fn breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.breaker.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    fn record_success(&self) {
        if let Some(breaker) = &self.breaker {
            breaker.record_success();
        }
    }

    fn record_failure(&self) {
        if let Some(breaker) = &self.breaker {
            breaker.record_failure();
        }
    }

    /// Execute the POST with circuit breaking, bounded retries, and
    /// exponential backoff.
    ///
    /// Transient failures (timeout, connection failure, HTTP 5xx) are retried
    /// up to the configured attempt budget; any other HTTP status is returned
    /// as-is for the normalizer to interpret. The breaker records a success
    /// only for 2xx responses and a failure for each transient outcome.
    ///
    /// # Errors
    ///
    /// - `UPSTREAM_UNAVAILABLE` when the circuit is open (no attempt is made)
    ///   or every attempt failed transiently
    /// - `UPSTREAM_ERROR` for a non-retryable transport fault
    #[instrument(skip(self, payload), fields(request_id))]
    pub async fn fetch(&self, payload: &WirePayload) -> ChatAdsResult<RawResponse> {
        if !self.circuit_available() {
            warn!("circuit breaker is open, rejecting request");
            return Err(ChatAdsError::upstream_unavailable(
                "ChatAds is temporarily unavailable (circuit breaker open). Try again shortly.",
            ));
        }

        let url = self.config.request_url();
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_error: Option<String> = None;

        for attempt in 1..=max_attempts {
            let start = Instant::now();
            match self.transport.post(&url, &request_id, payload).await {
                Ok(response) => {
                    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                    if (500..600).contains(&response.status) {
                        self.record_failure();
                        last_error = Some(format!("upstream returned HTTP {}", response.status));
                        debug!(attempt, status = response.status, "retryable server error");
                        self.backoff(attempt, max_attempts).await;
                        continue;
                    }
                    if (200..300).contains(&response.status) {
                        self.record_success();
                    }
                    debug!(
                        attempt,
                        status = response.status,
                        latency_ms,
                        "request completed"
                    );
                    return Ok(RawResponse {
                        body: response.body,
                        status_code: response.status,
                        latency_ms,
                    });
                }
                Err(err) if err.is_retryable() => {
                    self.record_failure();
                    let described = sanitize_error_text(&err.describe(), self.credential.as_deref());
                    debug!(attempt, error = %described, "retryable transport failure");
                    last_error = Some(described);
                    self.backoff(attempt, max_attempts).await;
                }
                Err(err) => {
                    let described = sanitize_error_text(&err.describe(), self.credential.as_deref());
                    return Err(ChatAdsError::upstream(described));
                }
            }
        }

        Err(ChatAdsError::upstream_unavailable(format!(
            "ChatAds request failed after {max_attempts} attempts: {}",
            last_error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    /// Sleep out the backoff window after a failed attempt; skipped after
    /// the final attempt.
    async fn backoff(&self, attempt: u32, max_attempts: u32) {
        if attempt < max_attempts {
            let delay = self.config.retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, Scripted};
    use chatads_core::retry::{CircuitBreakerConfig, RetryConfig};
    use chatads_core::ErrorCode;
    use serde_json::json;

    fn test_config() -> ClientConfig {
        ClientConfig::default()
            .with_base_url("https://api.test")
            .with_retry(RetryConfig {
                max_attempts: 3,
                backoff_base: std::time::Duration::from_millis(500),
                max_delay: std::time::Duration::from_secs(30),
            })
    }

    fn ok_body() -> Value {
        json!({ "success": true, "data": { "matched": false }, "meta": {} })
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = MockTransport::new(vec![Scripted::Status(200, ok_body())]);
        let client = ChatAdsClient::with_transport(transport, test_config());

        let response = client
            .fetch(&WirePayload::from_params(
                &crate::endpoints::messages::MessageParams::new("test message"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(client.transport().calls(), 1);
        assert_eq!(client.breaker().unwrap().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_through_timeouts_then_succeeds() {
        let transport = MockTransport::new(vec![
            Scripted::Timeout,
            Scripted::Timeout,
            Scripted::Status(200, ok_body()),
        ]);
        let client = ChatAdsClient::with_transport(transport, test_config());

        let payload = WirePayload::from_params(
            &crate::endpoints::messages::MessageParams::new("test message"),
        );
        let response = client.fetch(&payload).await.unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(client.transport().calls(), 3);
        // The success wiped the transient failures from the breaker.
        assert_eq!(client.breaker().unwrap().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_unavailable() {
        let transport = MockTransport::new(vec![Scripted::Timeout, Scripted::Timeout]);
        let mut config = test_config();
        config.retry.max_attempts = 2;
        let client = ChatAdsClient::with_transport(transport, config);

        let payload = WirePayload::from_params(
            &crate::endpoints::messages::MessageParams::new("test message"),
        );
        let err = client.fetch(&payload).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::UpstreamUnavailable);
        assert_eq!(client.transport().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_retried() {
        let transport = MockTransport::new(vec![
            Scripted::Status(500, json!({ "error": "internal" })),
            Scripted::Status(200, ok_body()),
        ]);
        let client = ChatAdsClient::with_transport(transport, test_config());

        let payload = WirePayload::from_params(
            &crate::endpoints::messages::MessageParams::new("test message"),
        );
        let response = client.fetch(&payload).await.unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(client.transport().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_returned_as_is() {
        let body = json!({
            "success": false,
            "error": { "code": "FORBIDDEN", "message": "Invalid API key" },
        });
        let transport = MockTransport::new(vec![Scripted::Status(403, body)]);
        let client = ChatAdsClient::with_transport(transport, test_config());

        let payload = WirePayload::from_params(
            &crate::endpoints::messages::MessageParams::new("test message"),
        );
        let response = client.fetch(&payload).await.unwrap();

        assert_eq!(response.status_code, 403);
        assert_eq!(client.transport().calls(), 1);
        // A 4xx is neither a breaker success nor a breaker failure.
        assert_eq!(client.breaker().unwrap().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_short_circuits() {
        let transport = MockTransport::new(vec![]);
        let mut config = test_config();
        config.circuit_breaker = Some(CircuitBreakerConfig {
            failure_threshold: 1,
            cooldown: std::time::Duration::from_secs(600),
        });
        let client = ChatAdsClient::with_transport(transport, config);
        client.breaker().unwrap().record_failure();
        assert_eq!(client.circuit_state(), Some(CircuitState::Open));

        let payload = WirePayload::from_params(
            &crate::endpoints::messages::MessageParams::new("test message"),
        );
        let err = client.fetch(&payload).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::UpstreamUnavailable);
        // No network attempt was made: the empty script was never consumed.
        assert_eq!(client.transport().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_breaker_reports_disabled() {
        let transport = MockTransport::new(vec![Scripted::Status(200, ok_body())]);
        let config = test_config().with_circuit_breaker(None);
        let client = ChatAdsClient::with_transport(transport, config);

        assert_eq!(client.circuit_state_label(), "disabled");
        assert!(client.circuit_available());
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let err = ChatAdsClient::new("", ClientConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }
}
