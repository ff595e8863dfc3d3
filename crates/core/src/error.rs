//! Error taxonomy for the ChatAds pipeline
//!
//! Every failure in the pipeline carries a machine-readable [`ErrorCode`]
//! alongside a human-readable message, so callers can branch on the code
//! while surfacing actionable text to end users.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type ChatAdsResult<T> = Result<T, ChatAdsError>;

/// Fixed replacement for error text that may carry credential material
pub const REDACTED_ERROR: &str = "Request error (details redacted for security)";

/// Machine-readable error codes
///
/// Upstream-defined codes (quota/auth failures and the like) are passed
/// through verbatim as strings in normalized results; this enum covers the
/// codes the pipeline itself can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A field failed validation (bad IP, country, language, or empty message)
    InvalidInput,
    /// Message has fewer than the minimum word count
    MessageTooShort,
    /// Message has more than the maximum word count
    MessageTooManyWords,
    /// Message exceeds the maximum character length
    MessageTooLong,
    /// Missing or empty credential
    ConfigurationError,
    /// All retries exhausted or the circuit breaker is open
    UpstreamUnavailable,
    /// Fallback for unrecognized upstream failures
    UpstreamError,
}

impl ErrorCode {
    /// The wire representation of the code
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::MessageTooShort => "MESSAGE_TOO_SHORT",
            Self::MessageTooManyWords => "MESSAGE_TOO_MANY_WORDS",
            Self::MessageTooLong => "MESSAGE_TOO_LONG",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamError => "UPSTREAM_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline error with code, message, and the HTTP status it maps to
#[derive(Error, Debug, Clone)]
pub struct ChatAdsError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable, actionable message
    pub message: String,
    /// HTTP status this error corresponds to in a normalized result
    pub status_code: u16,
}

impl fmt::Display for ChatAdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl ChatAdsError {
    /// Create a new error with an explicit code and status
    pub fn new(code: ErrorCode, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            code,
            message: message.into(),
            status_code,
        }
    }

    /// Malformed field value
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message, 400)
    }

    /// Message below the minimum word count
    #[must_use]
    pub fn message_too_short() -> Self {
        Self::new(
            ErrorCode::MessageTooShort,
            "Message must contain at least 2 words",
            400,
        )
    }

    /// Message above the maximum word count
    #[must_use]
    pub fn message_too_many_words() -> Self {
        Self::new(
            ErrorCode::MessageTooManyWords,
            "Message must contain at most 100 words",
            400,
        )
    }

    /// Message above the maximum character length
    #[must_use]
    pub fn message_too_long() -> Self {
        Self::new(
            ErrorCode::MessageTooLong,
            "Message must be at most 2000 characters",
            400,
        )
    }

    /// Missing or empty credential, or an unusable client configuration
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message, 500)
    }

    /// Retries exhausted or circuit open
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message, 503)
    }

    /// Unrecognized upstream failure
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message, 502)
    }

    /// Return a copy with the message sanitized against credential leaks
    #[must_use]
    pub fn sanitized(mut self, credential: Option<&str>) -> Self {
        self.message = sanitize_error_text(&self.message, credential);
        self
    }
}

/// Scrub error text that may carry credential material.
///
/// If the text contains the literal credential value, or a known
/// credential-carrying substring (`x-api-key`, `authorization`), the entire
/// message is replaced with [`REDACTED_ERROR`]. Full replacement avoids the
/// false safety of partial masking.
#[must_use]
pub fn sanitize_error_text(text: &str, credential: Option<&str>) -> String {
    let lower = text.to_lowercase();
    let leaks_header = lower.contains("x-api-key") || lower.contains("authorization");
    let leaks_credential = credential.is_some_and(|c| !c.is_empty() && text.contains(c));
    if leaks_header || leaks_credential {
        REDACTED_ERROR.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(ErrorCode::MessageTooShort.to_string(), "MESSAGE_TOO_SHORT");
        assert_eq!(
            ErrorCode::UpstreamUnavailable.to_string(),
            "UPSTREAM_UNAVAILABLE"
        );
    }

    #[test]
    fn test_code_serde_round_trip() {
        let json = serde_json::to_string(&ErrorCode::ConfigurationError).unwrap();
        assert_eq!(json, "\"CONFIGURATION_ERROR\"");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_error_display_includes_code() {
        let err = ChatAdsError::message_too_short();
        let rendered = err.to_string();
        assert!(rendered.contains("MESSAGE_TOO_SHORT"));
        assert!(rendered.contains("at least 2 words"));
    }

    #[test]
    fn test_constructor_status_codes() {
        assert_eq!(ChatAdsError::invalid_input("bad").status_code, 400);
        assert_eq!(ChatAdsError::configuration("no key").status_code, 500);
        assert_eq!(ChatAdsError::upstream_unavailable("down").status_code, 503);
        assert_eq!(ChatAdsError::upstream("odd").status_code, 502);
    }

    #[test]
    fn test_sanitize_masks_literal_credential() {
        let key = "my-secret-api-key";
        let text = format!("Failed with key {key}");
        let result = sanitize_error_text(&text, Some(key));
        assert_eq!(result, REDACTED_ERROR);
        assert!(!result.contains(key));
    }

    #[test]
    fn test_sanitize_masks_api_key_header() {
        let result = sanitize_error_text("Request failed with x-api-key: some_key", None);
        assert_eq!(result, REDACTED_ERROR);
    }

    #[test]
    fn test_sanitize_masks_authorization_header() {
        let result = sanitize_error_text("Authorization header invalid", None);
        assert_eq!(result, REDACTED_ERROR);
    }

    #[test]
    fn test_sanitize_passes_safe_text_through() {
        let result = sanitize_error_text("Connection timeout", None);
        assert_eq!(result, "Connection timeout");
    }

    #[test]
    fn test_sanitized_error_keeps_code() {
        let err = ChatAdsError::upstream_unavailable("x-api-key rejected").sanitized(None);
        assert_eq!(err.code, ErrorCode::UpstreamUnavailable);
        assert_eq!(err.message, REDACTED_ERROR);
    }
}
