//! High-level operations over the resilient client
//!
//! These are the two surfaces callers interact with: sending a message for
//! affiliate matching, and probing upstream health.

pub mod health;
pub mod messages;

pub use health::{health_check, health_check_with_config, HealthReport, HealthStatus};
pub use messages::{send_message, send_message_with_config, MessageParams};
