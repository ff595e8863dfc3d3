//! Resilient client for the ChatAds affiliate-matching API
//!
//! Given a natural-language message plus optional geo/device context, this
//! crate returns a normalized match/no-match/error result while shielding
//! both caller and upstream from transient failures, quota exhaustion, and
//! malformed input.
//!
//! # Features
//!
//! - **Input validation**: malformed requests fail fast, before any network
//!   call, with field-specific error codes
//! - **Retry with exponential backoff**: transient failures (timeouts,
//!   connection errors, HTTP 5xx) are retried within a bounded budget
//! - **Circuit breaker**: repeated failures trip the circuit and fail fast
//!   until a cooldown probe succeeds
//! - **Envelope normalization**: the upstream's success/no-match/error
//!   envelopes fold into one stable, JSON-serializable result shape
//! - **Quota monitoring**: usage figures are summarized per window and
//!   near-limit warnings attached to result metadata
//! - **Credential hygiene**: the API key travels only in a sensitive header
//!   and is scrubbed from every error message
//!
//! # Example
//!
//! ```rust,no_run
//! use chatads_api_client::{send_message, MessageParams};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Reads CHATADS_API_KEY from the environment.
//!     let result = send_message(
//!         MessageParams::new("best laptop for coding")
//!             .with_country("US")
//!             .with_language("en"),
//!     )
//!     .await;
//!
//!     if result.matched {
//!         println!("match: {:?} -> {:?}", result.product, result.affiliate_link);
//!     } else {
//!         println!("status: {:?}, reason: {:?}", result.status, result.reason);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod payload;
pub mod quota;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChatAdsClient, RawResponse};
pub use config::{resolve_api_key, ClientConfig};
pub use endpoints::health::{health_check, health_check_with_config, HealthReport, HealthStatus};
pub use endpoints::messages::{send_message, send_message_with_config, MessageParams};
pub use envelope::{MatchResult, ResponseMetadata, ResultStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::ChatAdsClient;
    pub use crate::config::{resolve_api_key, ClientConfig};
    pub use crate::endpoints::health::{health_check, HealthReport, HealthStatus};
    pub use crate::endpoints::messages::{send_message, MessageParams};
    pub use crate::envelope::{MatchResult, ResponseMetadata, ResultStatus};
    pub use crate::quota::{QuotaThresholds, UsageSummary};
    pub use crate::registry::ClientRegistry;
    pub use chatads_core::{ChatAdsError, ChatAdsResult, ErrorCode};
}
