//! Integration tests for the Resilient Executor
//!
//! This module tests the four core retry/fallback scenarios end to end
//! through the public `scrapecore` API:
//! - S1: transient failures that resolve within the retry budget
//! - S2: a default-value fallback once retries are exhausted
//! - S3: a cached fallback serving the last successful value
//! - S4: a per-operation circuit breaker opening, then recovering

use scrapecore::{CancellationToken, FallbackKind, OperationConfig, ResilientExecutor, RetryConfig};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// ============================================================================
// S1: retry-then-succeed
// ============================================================================

#[tokio::test]
async fn s1_transient_errors_recover_within_the_retry_budget() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    executor
        .configure_operation(
            "fetch_listing",
            OperationConfig {
                retry: RetryConfig { max_retries: 4, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5), backoff_factor: 2.0 },
                fallback: None,
            },
        )
        .await;

    let calls = AtomicU32::new(0);
    let cancel = CancellationToken::new();
    let result = executor
        .execute(
            "fetch_listing",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 3 { Err("503 service unavailable".to_string()) } else { Ok(json!({"ok": true})) } }
            },
            &cancel,
        )
        .await;

    assert!(result.success);
    assert_eq!(result.attempts, 4);
    assert!(!result.used_fallback);
}

#[tokio::test]
async fn s1_non_retryable_error_fails_immediately_without_exhausting_retries() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    executor
        .configure_operation("parse_body", OperationConfig { retry: RetryConfig { max_retries: 5, ..Default::default() }, fallback: None })
        .await;

    let calls = AtomicU32::new(0);
    let cancel = CancellationToken::new();
    let result = executor
        .execute(
            "parse_body",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<Value, _>("malformed json: unexpected token".to_string()) }
            },
            &cancel,
        )
        .await;

    assert!(!result.success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// S2: default-value fallback on exhaustion
// ============================================================================

#[tokio::test]
async fn s2_default_fallback_serves_a_fixed_value_once_retries_are_exhausted() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    executor
        .configure_operation(
            "fetch_price",
            OperationConfig {
                retry: RetryConfig { max_retries: 1, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(2), backoff_factor: 2.0 },
                fallback: Some(FallbackKind::Default(json!({"price": 0.0}))),
            },
        )
        .await;

    let cancel = CancellationToken::new();
    let result = executor.execute("fetch_price", || async { Err::<Value, _>("connection timeout".to_string()) }, &cancel).await;

    assert!(result.success);
    assert!(result.used_fallback);
    assert_eq!(result.fallback_kind.as_deref(), Some("default"));
    assert_eq!(result.value, Some(json!({"price": 0.0})));
    assert!(result.original_error.unwrap().contains("connection timeout"));
}

// ============================================================================
// S3: cached fallback
// ============================================================================

#[tokio::test]
async fn s3_cached_fallback_is_empty_until_a_success_populates_it() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    executor
        .configure_operation("fetch_reviews", OperationConfig { retry: RetryConfig { max_retries: 0, ..Default::default() }, fallback: Some(FallbackKind::Cached) })
        .await;
    let cancel = CancellationToken::new();

    let first = executor.execute("fetch_reviews", || async { Err::<Value, _>("refused".to_string()) }, &cancel).await;
    assert!(!first.success);
    assert_eq!(first.fallback_kind.as_deref(), Some("cached"));
}

#[tokio::test]
async fn s3_cached_fallback_serves_the_most_recent_success() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    executor
        .configure_operation("fetch_reviews", OperationConfig { retry: RetryConfig::default(), fallback: Some(FallbackKind::Cached) })
        .await;
    let cancel = CancellationToken::new();

    executor.execute("fetch_reviews", || async { Ok(json!({"rating": 4})) }, &cancel).await;
    executor.execute("fetch_reviews", || async { Ok(json!({"rating": 5})) }, &cancel).await;

    let failed = executor.execute("fetch_reviews", || async { Err::<Value, _>("timeout".to_string()) }, &cancel).await;
    assert!(failed.success);
    assert_eq!(failed.value, Some(json!({"rating": 5})));
}

// ============================================================================
// S4: per-operation circuit breaker opens, then recovers
// ============================================================================

#[tokio::test]
async fn s4_circuit_opens_after_threshold_and_short_circuits_further_calls() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    executor
        .configure_operation(
            "scrape_page",
            OperationConfig {
                retry: RetryConfig { max_retries: 0, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(1), backoff_factor: 1.0 },
                fallback: None,
            },
        )
        .await;
    let cancel = CancellationToken::new();
    let calls = AtomicU32::new(0);

    for _ in 0..5 {
        let r = executor
            .execute(
                "scrape_page",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<Value, _>("timeout".to_string()) }
                },
                &cancel,
            )
            .await;
        assert!(!r.success);
    }
    let calls_before_open = calls.load(Ordering::SeqCst);

    // Breaker is open now: the op closure must not run at all.
    let r = executor.execute("scrape_page", || async { Ok(json!("should not run")) }, &cancel).await;
    assert!(!r.success);
    assert!(r.original_error.unwrap().contains("circuit breaker"));
    assert_eq!(calls.load(Ordering::SeqCst), calls_before_open);
}

#[tokio::test]
async fn s4_independent_operations_have_independent_breakers() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    let flaky_config =
        OperationConfig { retry: RetryConfig { max_retries: 0, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(1), backoff_factor: 1.0 }, fallback: None };
    executor.configure_operation("flaky", flaky_config.clone()).await;
    executor.configure_operation("healthy", flaky_config).await;
    let cancel = CancellationToken::new();

    for _ in 0..5 {
        executor.execute("flaky", || async { Err::<Value, _>("timeout".to_string()) }, &cancel).await;
    }
    let flaky_after_open = executor.execute("flaky", || async { Ok(json!("x")) }, &cancel).await;
    assert!(!flaky_after_open.success);

    let healthy = executor.execute("healthy", || async { Ok(json!("y")) }, &cancel).await;
    assert!(healthy.success);
}
