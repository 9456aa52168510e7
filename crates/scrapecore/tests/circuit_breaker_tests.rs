//! Integration tests for the shared circuit breaker across its two call
//! sites: per-proxy (the registry) and per-operation (the executor).
//!
//! This module tests:
//! - A breaker constructed directly reaching HALF_OPEN and closing again
//! - The registry's per-proxy breaker tracking failures reported against it
//! - The executor's per-operation breaker opening independently of the registry

use scrapecore::{CancellationToken, CircuitBreaker, CircuitState, OperationConfig, ProxyDescriptor, ProxyRegistry, ProxyType, RegistryConfig, ResilientExecutor, RetryConfig};
use serde_json::{json, Value};
use std::time::Duration;

fn descriptor(id: &str) -> ProxyDescriptor {
    ProxyDescriptor {
        id: id.to_string(),
        proxy_type: ProxyType::Http,
        host: "127.0.0.1".into(),
        port: 8080,
        username: None,
        password: None,
        weight: 1,
        geo: None,
        tags: vec![],
        cost_per_request: None,
        max_concurrent: None,
    }
}

// ============================================================================
// Bare breaker state machine
// ============================================================================

#[test]
fn full_cycle_closed_to_open_to_half_open_to_closed() {
    let mut breaker = CircuitBreaker::new("checkout", 2, Duration::from_millis(10));
    assert_eq!(breaker.state, CircuitState::Closed);

    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.state, CircuitState::Open);
    assert!(!breaker.can_execute());

    std::thread::sleep(Duration::from_millis(15));
    assert!(breaker.can_execute());
    assert_eq!(breaker.state, CircuitState::HalfOpen);

    breaker.record_success();
    assert_eq!(breaker.state, CircuitState::Closed);
    assert_eq!(breaker.failure_count, 0);
}

// ============================================================================
// Registry-owned, per-proxy breaker
// ============================================================================

#[tokio::test]
async fn registry_breaker_opens_independently_per_proxy() {
    let registry = ProxyRegistry::new(vec![descriptor("p1"), descriptor("p2")], RegistryConfig { failure_threshold: 3, ..RegistryConfig::default() });

    for _ in 0..3 {
        registry.report_failure("p1", "timeout").await;
    }
    registry.report_failure("p2", "timeout").await;

    let p1_state = registry.breaker_for("p1").await.unwrap().lock().await.state;
    let p2_state = registry.breaker_for("p2").await.unwrap().lock().await.state;
    assert_eq!(p1_state, CircuitState::Open);
    assert_eq!(p2_state, CircuitState::Closed);
}

#[tokio::test]
async fn registry_breaker_recovers_on_reported_success() {
    let registry = ProxyRegistry::new(vec![descriptor("p1")], RegistryConfig { failure_threshold: 5, breaker_reset_timeout: Duration::from_millis(10), ..RegistryConfig::default() });
    for _ in 0..5 {
        registry.report_failure("p1", "timeout").await;
    }
    assert_eq!(registry.breaker_for("p1").await.unwrap().lock().await.state, CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(20)).await;
    registry.report_success("p1").await;
    assert_eq!(registry.breaker_for("p1").await.unwrap().lock().await.state, CircuitState::Closed);
}

// ============================================================================
// Executor-owned, per-operation breaker
// ============================================================================

#[tokio::test]
async fn executor_breaker_for_one_operation_does_not_affect_a_sibling_operation() {
    let executor = ResilientExecutor::new(Duration::from_secs(60));
    let config = OperationConfig { retry: RetryConfig { max_retries: 0, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(1), backoff_factor: 1.0 }, fallback: None };
    executor.configure_operation("checkout", config.clone()).await;
    executor.configure_operation("search", config).await;
    let cancel = CancellationToken::new();

    for _ in 0..5 {
        executor.execute("checkout", || async { Err::<Value, _>("timeout".to_string()) }, &cancel).await;
    }

    let checkout_blocked = executor.execute("checkout", || async { Ok(json!("late success")) }, &cancel).await;
    assert!(!checkout_blocked.success);

    let search_ok = executor.execute("search", || async { Ok(json!("results")) }, &cancel).await;
    assert!(search_ok.success);
}
