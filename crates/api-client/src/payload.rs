//! Wire payload construction
//!
//! Maps validated caller arguments onto the upstream's request shape. Field
//! names follow the upstream's casing (`userAgent`), and absent optional
//! fields are omitted from the JSON entirely, never sent as `null`. No
//! validation happens here (that runs before this step) and no size capping
//! (the upstream enforces its own limits).

use crate::endpoints::messages::MessageParams;
use serde::Serialize;

/// JSON body POSTed to the message-send endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WirePayload {
    /// The conversational message to match against
    pub message: String,
    /// Caller IP for geo-targeting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Caller device user agent
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// ISO 639-1 language code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl WirePayload {
    /// Build the wire shape from caller parameters, verbatim
    #[must_use]
    pub fn from_params(params: &MessageParams) -> Self {
        Self {
            message: params.message.clone(),
            ip: params.ip.clone(),
            user_agent: params.user_agent.clone(),
            country: params.country.clone(),
            language: params.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload_renames_user_agent() {
        let params = MessageParams::new("best laptop for coding")
            .with_ip("8.8.8.8")
            .with_user_agent("Mozilla/5.0")
            .with_country("US")
            .with_language("en");
        let payload = WirePayload::from_params(&params);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["message"], "best laptop for coding");
        assert_eq!(json["ip"], "8.8.8.8");
        assert_eq!(json["userAgent"], "Mozilla/5.0");
        assert_eq!(json["country"], "US");
        assert_eq!(json["language"], "en");
        assert!(json.get("user_agent").is_none());
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let payload = WirePayload::from_params(&MessageParams::new("test message"));
        let json = serde_json::to_value(&payload).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 1);
        assert!(object.contains_key("message"));
        assert!(!object.contains_key("ip"));
        assert!(!object.contains_key("userAgent"));
        assert!(!object.contains_key("country"));
        assert!(!object.contains_key("language"));
    }

    #[test]
    fn test_large_message_passes_through_unchanged() {
        // Size limits are the upstream's concern; the builder never truncates.
        let long_message = "word ".repeat(400);
        let payload = WirePayload::from_params(&MessageParams::new(long_message.clone()));
        assert_eq!(payload.message, long_message);
    }
}
