//! Request input validation
//!
//! Rejects malformed requests before any network call. Checks run in a fixed
//! order and short-circuit at the first failure, so callers always get the
//! most specific error code for the first problem found. Pure function of its
//! inputs; no I/O.

use crate::error::{ChatAdsError, ChatAdsResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

/// Minimum whitespace-delimited words in a message
pub const MIN_MESSAGE_WORDS: usize = 2;
/// Maximum whitespace-delimited words in a message
pub const MAX_MESSAGE_WORDS: usize = 100;
/// Maximum message length in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

// Shape checks only; neither list is validated against the real registries.
static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z]{2}$").unwrap());
static LANGUAGE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z]{2}$").unwrap());

/// Validate caller arguments before building a wire payload.
///
/// # Errors
///
/// - `CONFIGURATION_ERROR` for an empty credential
/// - `MESSAGE_TOO_SHORT` / `MESSAGE_TOO_MANY_WORDS` / `MESSAGE_TOO_LONG` for
///   message shape violations
/// - `INVALID_INPUT` for an empty message or a malformed ip/country/language
pub fn validate_inputs(
    message: &str,
    ip: Option<&str>,
    country: Option<&str>,
    language: Option<&str>,
    credential: &str,
) -> ChatAdsResult<()> {
    if credential.trim().is_empty() {
        return Err(ChatAdsError::configuration(
            "ChatAds API key is not set. Pass api_key or set the CHATADS_API_KEY environment variable.",
        ));
    }

    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ChatAdsError::invalid_input("message cannot be empty"));
    }

    let word_count = trimmed.split_whitespace().count();
    if word_count < MIN_MESSAGE_WORDS {
        return Err(ChatAdsError::message_too_short());
    }
    if word_count > MAX_MESSAGE_WORDS {
        return Err(ChatAdsError::message_too_many_words());
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatAdsError::message_too_long());
    }

    if let Some(ip) = ip {
        if ip.parse::<IpAddr>().is_err() {
            return Err(ChatAdsError::invalid_input(format!(
                "Invalid IP address: {ip}"
            )));
        }
    }

    if let Some(country) = country {
        if !COUNTRY_CODE.is_match(country) {
            return Err(ChatAdsError::invalid_input(format!(
                "country must be a 2-letter uppercase ISO 3166-1 alpha-2 code, got {country:?}"
            )));
        }
    }

    if let Some(language) = language {
        if !LANGUAGE_CODE.is_match(language) {
            return Err(ChatAdsError::invalid_input(format!(
                "language must be a 2-letter lowercase ISO 639-1 code, got {language:?}"
            )));
        }
    }

    Ok(())
}
