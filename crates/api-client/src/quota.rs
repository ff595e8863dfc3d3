//! Quota usage summarization and warnings
//!
//! The upstream embeds raw usage counters in its response metadata. This
//! module condenses them into a per-window [`UsageSummary`] and produces
//! human-readable warnings as the caller approaches a quota limit. Decoding
//! is all-or-nothing: a malformed or partial usage payload yields no summary
//! rather than a misleading one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Usage within a single quota window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUsage {
    /// Requests consumed in the window
    pub used: u64,
    /// Window limit
    pub limit: u64,
    /// Requests left, where the upstream reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

/// Condensed usage figures across the upstream's quota windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Monthly window (free-tier accounting)
    pub monthly: WindowUsage,
    /// Daily window
    pub daily: WindowUsage,
    /// Per-minute window
    pub minute: WindowUsage,
    /// Whether the account is on the free tier
    pub is_free_tier: bool,
    /// Whether a credit card is on file
    pub has_credit_card: bool,
}

/// Raw usage block as the upstream reports it; every counter is required so
/// a partial payload fails the decode as a whole.
#[derive(Debug, Deserialize)]
struct RawUsage {
    monthly_requests: u64,
    free_tier_limit: u64,
    free_tier_remaining: u64,
    daily_requests: u64,
    daily_limit: u64,
    minute_requests: u64,
    minute_limit: u64,
    #[serde(default)]
    is_free_tier: bool,
    #[serde(default)]
    has_credit_card: bool,
}

/// Summarize the upstream's raw usage mapping.
///
/// Returns `None` when the payload is absent, not a mapping, or missing any
/// required counter.
#[must_use]
pub fn summarize_usage(raw: Option<&Value>) -> Option<UsageSummary> {
    let raw: RawUsage = serde_json::from_value(raw?.clone()).ok()?;
    Some(UsageSummary {
        monthly: WindowUsage {
            used: raw.monthly_requests,
            limit: raw.free_tier_limit,
            remaining: Some(raw.free_tier_remaining),
        },
        daily: WindowUsage {
            used: raw.daily_requests,
            limit: raw.daily_limit,
            remaining: None,
        },
        minute: WindowUsage {
            used: raw.minute_requests,
            limit: raw.minute_limit,
            remaining: None,
        },
        is_free_tier: raw.is_free_tier,
        has_credit_card: raw.has_credit_card,
    })
}

/// Cutoffs at which quota warnings fire
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaThresholds {
    /// Warn when monthly remaining falls to this count or below
    pub monthly_low_remaining: u64,
    /// Warn when daily used/limit reaches this ratio
    pub daily_ratio: f64,
    /// Warn when minute used/limit reaches this ratio (or used is one short
    /// of the limit)
    pub minute_ratio: f64,
}

impl Default for QuotaThresholds {
    fn default() -> Self {
        Self {
            monthly_low_remaining: 10,
            daily_ratio: 0.90,
            minute_ratio: 0.80,
        }
    }
}

/// Evaluate quota warnings for a usage summary.
///
/// Each window is checked independently; firing warnings are joined with
/// `" | "`. Returns `None` when nothing is close to a limit.
#[must_use]
pub fn check_warnings(usage: &UsageSummary, thresholds: &QuotaThresholds) -> Option<String> {
    let mut warnings = Vec::new();

    if let Some(remaining) = usage.monthly.remaining {
        if remaining <= thresholds.monthly_low_remaining {
            warnings.push(format!(
                "Monthly quota nearly exhausted: {remaining} requests remaining"
            ));
        }
    }

    if usage.daily.limit > 0 {
        let ratio = usage.daily.used as f64 / usage.daily.limit as f64;
        if ratio >= thresholds.daily_ratio {
            warnings.push(format!(
                "Daily quota at {:.0}% ({}/{})",
                ratio * 100.0,
                usage.daily.used,
                usage.daily.limit
            ));
        }
    }

    if usage.minute.limit > 0 {
        let ratio = usage.minute.used as f64 / usage.minute.limit as f64;
        if ratio >= thresholds.minute_ratio || usage.minute.used + 1 == usage.minute.limit {
            warnings.push(format!(
                "Approaching the per-minute rate limit ({}/{})",
                usage.minute.used, usage.minute.limit
            ));
        }
    }

    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join(" | "))
    }
}
