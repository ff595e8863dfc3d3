//! Shared test doubles for the client and endpoint tests

use crate::client::{Transport, TransportError, TransportResponse};
use crate::payload::WirePayload;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted outcome for a [`MockTransport`] attempt
pub(crate) enum Scripted {
    /// Respond with this HTTP status and body
    Status(u16, Value),
    /// Fail the attempt with a timeout
    Timeout,
    /// Fail the attempt with a connection error
    Connect,
}

/// Transport that replays a fixed script of attempt outcomes and counts
/// how many attempts were made.
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    async fn post(
        &self,
        _url: &str,
        _request_id: &str,
        _payload: &WirePayload,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock transport script exhausted: unexpected network attempt");
        match step {
            Scripted::Status(status, body) => Ok(TransportResponse { status, body }),
            Scripted::Timeout => Err(TransportError::Timeout),
            Scripted::Connect => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}

/// Envelope with a matched offer, as the upstream sends it
pub(crate) fn matched_envelope(request_id: &str) -> Value {
    json!({
        "success": true,
        "data": {
            "matched": true,
            "ad": {
                "product": "MacBook Pro M3",
                "link": "https://amazon.com/macbook-pro",
                "category": "laptops",
                "message": "Perfect for developers!",
            },
            "reason": "exact_match: high confidence",
        },
        "meta": {
            "request_id": request_id,
            "country": "US",
            "language": "en",
            "usage": {
                "monthly_requests": 10,
                "free_tier_limit": 1000,
                "free_tier_remaining": 990,
                "daily_requests": 5,
                "daily_limit": 100,
                "minute_requests": 1,
                "minute_limit": 5,
                "is_free_tier": true,
                "has_credit_card": false,
            },
        },
    })
}

/// Envelope for an answered request with no matching offer
pub(crate) fn no_match_envelope(request_id: &str) -> Value {
    json!({
        "success": true,
        "data": { "matched": false, "reason": "no_match: insufficient context" },
        "meta": { "request_id": request_id },
    })
}
