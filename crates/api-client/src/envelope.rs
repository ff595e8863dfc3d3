//! Envelope normalization
//!
//! The upstream answers every request with a JSON envelope in one of three
//! shapes: a matched offer, an explicit no-match, or an error object. This
//! module folds any of them (plus transport metadata) into one stable
//! [`MatchResult`]; a body matching none of the known shapes normalizes to an
//! error result rather than a crash.

use crate::quota::{summarize_usage, UsageSummary};
use chatads_core::ChatAdsError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Prefix marking request ids minted locally rather than by the upstream
const LOCAL_REQUEST_ID_PREFIX: &str = "local-";

/// Default error code when the upstream reports failure without one
const DEFAULT_ERROR_CODE: &str = "UPSTREAM_ERROR";

/// Message used when the upstream gives neither a message nor a known code
const GENERIC_ERROR_MESSAGE: &str =
    "ChatAds could not process this request. Try again shortly.";

/// Friendly substitutions for upstream error codes whose raw messages tend
/// to be empty or unhelpful.
static ERROR_HINTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "UNAUTHORIZED",
            "Your ChatAds API key is missing or invalid. Set CHATADS_API_KEY and retry.",
        ),
        (
            "FORBIDDEN",
            "This ChatAds API key is not allowed to call the matching endpoint. Check the key's plan and permissions.",
        ),
        (
            "QUOTA_EXCEEDED",
            "Your ChatAds quota is exhausted for the current window. Upgrade the plan or wait for the window to reset.",
        ),
        (
            "RATE_LIMITED",
            "Too many requests in a short burst. Slow down and retry in a moment.",
        ),
    ])
});

/// Overall outcome of a normalized call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// An offer matched the message
    Success,
    /// The upstream answered but found no offer
    NoMatch,
    /// The call failed, locally or upstream
    Error,
}

/// Transport and accounting metadata attached to every result
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    /// Upstream request id, or a locally minted `local-` id
    pub request_id: String,
    /// Round-trip latency in milliseconds, rounded to 2 decimals
    pub latency_ms: f64,
    /// HTTP status of the final attempt (or the status an error maps to)
    pub status_code: u16,
    /// Country echoed from the upstream meta block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Language echoed from the upstream meta block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Condensed quota usage, when the upstream reported well-formed figures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_summary: Option<UsageSummary>,
    /// Quota warnings, when any window is near its limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Normalized result returned to the caller; JSON-serializable as-is
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Overall outcome
    pub status: ResultStatus,
    /// Whether an offer matched
    pub matched: bool,
    /// Matched product name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Matched product category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Affiliate link for the matched offer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate_link: Option<String>,
    /// Suggested wording accompanying the offer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate_message: Option<String>,
    /// Why no offer matched (no-match results only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Machine-readable error code (error results only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Actionable error text (error results only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Always present
    pub metadata: ResponseMetadata,
}

impl MatchResult {
    /// Fold a pipeline error into the normalized error shape
    #[must_use]
    pub fn from_error(error: &ChatAdsError, latency_ms: f64) -> Self {
        Self {
            status: ResultStatus::Error,
            matched: false,
            product: None,
            category: None,
            affiliate_link: None,
            affiliate_message: None,
            reason: None,
            error_code: Some(error.code.as_str().to_string()),
            error_message: Some(error.message.clone()),
            metadata: ResponseMetadata {
                request_id: local_request_id(),
                latency_ms: round2(latency_ms),
                status_code: error.status_code,
                country: None,
                language: None,
                usage_summary: None,
                notes: None,
            },
        }
    }
}

// Loose mirror of the upstream envelope. Every field is optional so the
// decode is total over well-formed JSON objects; anything else falls back to
// the default (and thus to the error branch).
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    success: Option<bool>,
    data: Option<RawData>,
    error: Option<RawError>,
    meta: Option<RawMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct RawData {
    matched: Option<bool>,
    ad: Option<RawAd>,
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAd {
    product: Option<String>,
    category: Option<String>,
    link: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    request_id: Option<String>,
    country: Option<String>,
    language: Option<String>,
    usage: Option<Value>,
}

/// Convert a raw upstream body plus transport metadata into a [`MatchResult`].
#[must_use]
pub fn normalize(body: &Value, status_code: u16, latency_ms: f64, source_url: &str) -> MatchResult {
    let envelope: RawEnvelope = serde_json::from_value(body.clone()).unwrap_or_default();
    let metadata = build_metadata(envelope.meta.unwrap_or_default(), status_code, latency_ms);
    debug!(source_url, status_code, "normalizing upstream envelope");

    let base = MatchResult {
        status: ResultStatus::Error,
        matched: false,
        product: None,
        category: None,
        affiliate_link: None,
        affiliate_message: None,
        reason: None,
        error_code: None,
        error_message: None,
        metadata,
    };

    if !(200..300).contains(&status_code) || envelope.success != Some(true) {
        let error = envelope.error.unwrap_or_default();
        let code = error
            .code
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string());
        let message = friendly_error_message(&code, error.message.as_deref());
        return MatchResult {
            error_code: Some(code),
            error_message: Some(message),
            ..base
        };
    }

    let data = envelope.data.unwrap_or_default();
    if data.matched == Some(true) {
        let ad = data.ad.unwrap_or_default();
        MatchResult {
            status: ResultStatus::Success,
            matched: true,
            product: ad.product,
            category: ad.category,
            affiliate_link: ad.link,
            affiliate_message: ad.message,
            ..base
        }
    } else {
        MatchResult {
            status: ResultStatus::NoMatch,
            reason: normalize_reason(data.reason.as_deref()),
            ..base
        }
    }
}

/// Pick the upstream's error message when it says something, otherwise a
/// friendly hint for known codes, otherwise the generic fallback.
fn friendly_error_message(code: &str, raw_message: Option<&str>) -> String {
    if let Some(message) = raw_message {
        let trimmed = message.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    ERROR_HINTS
        .get(code)
        .copied()
        .unwrap_or(GENERIC_ERROR_MESSAGE)
        .to_string()
}

/// Prettify a no-match reason: the segment before the first colon gets its
/// underscores replaced and its first letter capitalized; everything after
/// the colon is left untouched. Empty reasons become `None`.
fn normalize_reason(reason: Option<&str>) -> Option<String> {
    let reason = reason?.trim();
    if reason.is_empty() {
        return None;
    }
    match reason.split_once(':') {
        Some((head, rest)) => {
            let head = head.replace('_', " ");
            let mut chars = head.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => head,
            };
            Some(format!("{capitalized}:{rest}"))
        }
        None => Some(reason.to_string()),
    }
}

fn build_metadata(meta: RawMeta, status_code: u16, latency_ms: f64) -> ResponseMetadata {
    let request_id = meta
        .request_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(local_request_id);
    ResponseMetadata {
        request_id,
        latency_ms: round2(latency_ms),
        status_code,
        country: meta.country,
        language: meta.language,
        usage_summary: summarize_usage(meta.usage.as_ref()),
        notes: None,
    }
}

fn local_request_id() -> String {
    format!("{LOCAL_REQUEST_ID_PREFIX}{}", Uuid::new_v4())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
