//! Walkthrough of the ChatAds client: basic lookup, geo targeting, error
//! handling, concurrent sends, and quota monitoring.
//!
//! Setup:
//!     export CHATADS_API_KEY=your_chatads_api_key
//!     cargo run --example basic_usage

use anyhow::Result;
use chatads_api_client::{health_check, send_message, MessageParams, MatchResult, ResultStatus};

fn print_result(result: &MatchResult) {
    println!("status: {:?}, matched: {}", result.status, result.matched);
    match result.status {
        ResultStatus::Success => {
            println!("  product:  {}", result.product.as_deref().unwrap_or("-"));
            println!(
                "  link:     {}",
                result.affiliate_link.as_deref().unwrap_or("-")
            );
            println!(
                "  message:  {}",
                result.affiliate_message.as_deref().unwrap_or("-")
            );
        }
        ResultStatus::NoMatch => {
            println!("  reason:   {}", result.reason.as_deref().unwrap_or("-"));
        }
        ResultStatus::Error => {
            println!(
                "  error:    {} - {}",
                result.error_code.as_deref().unwrap_or("-"),
                result.error_message.as_deref().unwrap_or("-")
            );
        }
    }
    println!(
        "  metadata: request_id={}, latency={:.2}ms, http={}",
        result.metadata.request_id, result.metadata.latency_ms, result.metadata.status_code
    );
}

async fn example_basic_lookup() {
    println!("--- Basic affiliate lookup ---");
    let result = send_message(MessageParams::new("best laptop for coding")).await;
    print_result(&result);
    println!();
}

async fn example_geo_targeting() {
    println!("--- Geographic targeting ---");
    let result = send_message(
        MessageParams::new("best headphones for music")
            .with_country("US")
            .with_language("en"),
    )
    .await;
    print_result(&result);
    println!(
        "  geo echo: country={:?}, language={:?}\n",
        result.metadata.country, result.metadata.language
    );
}

async fn example_error_handling() {
    println!("--- Error handling ---");

    // Too short: fails validation before any network call.
    let result = send_message(MessageParams::new("laptop")).await;
    print_result(&result);

    // Invalid country code shape.
    let result =
        send_message(MessageParams::new("best laptop for coding").with_country("USA")).await;
    print_result(&result);
    println!();
}

async fn example_concurrent_requests() {
    println!("--- Concurrent requests ---");
    let queries = [
        "best laptop for coding",
        "best headphones for music",
        "best monitor for design",
        "best keyboard for gaming",
    ];

    let started = std::time::Instant::now();
    let handles: Vec<_> = queries
        .iter()
        .map(|query| tokio::spawn(send_message(MessageParams::new(*query))))
        .collect();

    for (query, handle) in queries.iter().zip(handles) {
        let result = handle.await.expect("send task panicked");
        println!(
            "  {query}: {:?} ({:.0}ms)",
            result.status, result.metadata.latency_ms
        );
    }
    println!(
        "  total wall clock: {:.0}ms\n",
        started.elapsed().as_secs_f64() * 1000.0
    );
}

async fn example_quota_monitoring() {
    println!("--- Quota monitoring ---");
    let result = send_message(MessageParams::new("best laptop for students")).await;

    if let Some(usage) = &result.metadata.usage_summary {
        println!(
            "  monthly: {}/{} (remaining: {:?})",
            usage.monthly.used, usage.monthly.limit, usage.monthly.remaining
        );
        println!("  daily:   {}/{}", usage.daily.used, usage.daily.limit);
        println!("  minute:  {}/{}", usage.minute.used, usage.minute.limit);
        println!(
            "  account: free_tier={}, credit_card={}",
            usage.is_free_tier, usage.has_credit_card
        );
        if let Some(notes) = &result.metadata.notes {
            println!("  warnings: {notes}");
        }
    } else {
        println!("  no usage data in response");
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatads_api_client=info".into()),
        )
        .init();

    if std::env::var("CHATADS_API_KEY").is_err() {
        eprintln!("CHATADS_API_KEY is not set; get a key from https://getchatads.com");
        std::process::exit(1);
    }

    println!("--- Health check ---");
    let health = health_check().await;
    println!(
        "status: {:?}, reachable: {}, breaker: {}, latency: {:.2}ms\n",
        health.status, health.api_reachable, health.circuit_breaker_state, health.latency_ms
    );

    example_basic_lookup().await;
    example_geo_targeting().await;
    example_error_handling().await;
    example_concurrent_requests().await;
    example_quota_monitoring().await;

    Ok(())
}
