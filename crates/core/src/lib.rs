//! Core primitives for the ChatAds API client
//!
//! This crate provides the I/O-free building blocks the HTTP client layers
//! on top of:
//!
//! - **Error taxonomy**: machine-readable codes with actionable messages and
//!   credential-safe sanitization
//! - **Retry policy**: bounded attempts with exponential backoff
//! - **Circuit breaker**: per-client failure tracking with a testable clock
//! - **Input validation**: message/geo/credential checks that fail fast
//!   before any network call
//!
//! # Example
//!
//! ```rust
//! use chatads_core::retry::{CircuitBreaker, CircuitBreakerConfig};
//! use chatads_core::validation::validate_inputs;
//!
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
//! assert!(breaker.is_available());
//!
//! validate_inputs("best laptop for coding", None, Some("US"), None, "my-key")
//!     .expect("inputs are well-formed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod retry;
pub mod validation;

pub use error::{ChatAdsError, ChatAdsResult, ErrorCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{sanitize_error_text, ChatAdsError, ChatAdsResult, ErrorCode};
    pub use crate::retry::{
        CircuitBreaker, CircuitBreakerConfig, CircuitState, Clock, RetryConfig, SystemClock,
    };
    pub use crate::validation::validate_inputs;
}
