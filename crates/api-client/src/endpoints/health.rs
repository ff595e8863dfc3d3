//! Upstream health probing
//!
//! Answers "can we reach ChatAds right now?" for operational monitoring
//! without consuming matching quota. A deliberately minimal probe is sent:
//! the upstream rejects it at its own validation layer, which still proves
//! the service is up and answering. An open circuit breaker short-circuits
//! the probe entirely.

use crate::client::{ChatAdsClient, Transport};
use crate::config::{resolve_api_key, ClientConfig};
use crate::envelope::normalize;
use crate::payload::WirePayload;
use crate::registry::ClientRegistry;
use serde::Serialize;
use std::time::Instant;

/// One-word probe body; the upstream rejects it before any quota accounting.
const PROBE_MESSAGE: &str = "ping";

/// Overall upstream health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The probe got a successful response
    Healthy,
    /// The upstream answered, but with a typed rejection
    Degraded,
    /// The upstream could not be reached (or the circuit is open)
    Unhealthy,
}

/// Health-check result for operational monitoring
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall verdict
    pub status: HealthStatus,
    /// Whether the upstream answered at all
    pub api_reachable: bool,
    /// Circuit breaker state label (`closed`/`open`/`half_open`/`disabled`)
    pub circuit_breaker_state: String,
    /// Probe latency in milliseconds
    pub latency_ms: f64,
    /// Error code, when the probe did not come back healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Error message, when the probe did not come back healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Probe upstream health using environment configuration.
pub async fn health_check() -> HealthReport {
    health_check_with_config(&ClientConfig::from_env()).await
}

/// Probe upstream health with an explicit configuration.
pub async fn health_check_with_config(config: &ClientConfig) -> HealthReport {
    let api_key = match resolve_api_key(None) {
        Ok(key) => key,
        Err(err) => {
            return HealthReport {
                status: HealthStatus::Unhealthy,
                api_reachable: false,
                circuit_breaker_state: "unknown".to_string(),
                latency_ms: 0.0,
                error_code: Some(err.code.as_str().to_string()),
                error_message: Some(err.message),
            };
        }
    };
    let client = match ClientRegistry::shared().get_or_create(&api_key, config) {
        Ok(client) => client,
        Err(err) => {
            return HealthReport {
                status: HealthStatus::Unhealthy,
                api_reachable: false,
                circuit_breaker_state: "unknown".to_string(),
                latency_ms: 0.0,
                error_code: Some(err.code.as_str().to_string()),
                error_message: Some(err.message),
            };
        }
    };
    probe(client.as_ref()).await
}

/// Run the probe against an already-built client.
pub(crate) async fn probe<T: Transport>(client: &ChatAdsClient<T>) -> HealthReport {
    if !client.circuit_available() {
        return HealthReport {
            status: HealthStatus::Unhealthy,
            api_reachable: false,
            circuit_breaker_state: client.circuit_state_label().to_string(),
            latency_ms: 0.0,
            error_code: None,
            error_message: Some("circuit breaker is open; probe skipped".to_string()),
        };
    }

    let payload = WirePayload {
        message: PROBE_MESSAGE.to_string(),
        ip: None,
        user_agent: None,
        country: None,
        language: None,
    };
    let started = Instant::now();

    match client.fetch(&payload).await {
        Ok(response) => {
            if (200..300).contains(&response.status_code) {
                HealthReport {
                    status: HealthStatus::Healthy,
                    api_reachable: true,
                    circuit_breaker_state: client.circuit_state_label().to_string(),
                    latency_ms: round2(response.latency_ms),
                    error_code: None,
                    error_message: None,
                }
            } else {
                // The upstream answered with a typed rejection: reachable,
                // but not a clean bill of health.
                let normalized = normalize(
                    &response.body,
                    response.status_code,
                    response.latency_ms,
                    &client.config().request_url(),
                );
                HealthReport {
                    status: HealthStatus::Degraded,
                    api_reachable: true,
                    circuit_breaker_state: client.circuit_state_label().to_string(),
                    latency_ms: round2(response.latency_ms),
                    error_code: normalized.error_code,
                    error_message: normalized.error_message,
                }
            }
        }
        Err(err) => HealthReport {
            status: HealthStatus::Unhealthy,
            api_reachable: false,
            circuit_breaker_state: client.circuit_state_label().to_string(),
            latency_ms: round2(started.elapsed().as_secs_f64() * 1000.0),
            error_code: Some(err.code.as_str().to_string()),
            error_message: Some(err.message),
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
