//! Integration tests for the Proxy Registry and rotation strategies
//!
//! This module tests:
//! - Registry availability bookkeeping across failure/recovery cycles
//! - Round-robin, weighted, and performance-based selection over a shared pool
//! - Per-proxy circuit breaker interaction with the registry

use scrapecore::{select_performance_based, select_weighted, PerformanceTracker, Proxy, ProxyDescriptor, ProxyRegistry, ProxyType, RegistryConfig, RoundRobin};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

fn descriptor(id: &str, weight: u32) -> ProxyDescriptor {
    ProxyDescriptor {
        id: id.to_string(),
        proxy_type: ProxyType::Http,
        host: "127.0.0.1".into(),
        port: 8080,
        username: None,
        password: None,
        weight,
        geo: None,
        tags: vec![],
        cost_per_request: None,
        max_concurrent: None,
    }
}

fn small_pool() -> Vec<ProxyDescriptor> {
    vec![descriptor("p1", 1), descriptor("p2", 1), descriptor("p3", 5)]
}

// ============================================================================
// Registry availability
// ============================================================================

#[tokio::test]
async fn proxies_drop_out_after_repeated_failures_and_return_after_recovery_window() {
    let mut config = RegistryConfig::default();
    config.recovery_time = Duration::from_millis(20);
    let registry = ProxyRegistry::new(small_pool(), config);

    for _ in 0..5 {
        registry.report_failure("p1", "connection refused").await;
    }
    let available: Vec<String> = registry.list_available().await.iter().map(|p| p.id().to_string()).collect();
    assert!(!available.contains(&"p1".to_string()));
    assert!(available.contains(&"p2".to_string()));

    tokio::time::sleep(Duration::from_millis(30)).await;
    let available: Vec<String> = registry.list_available().await.iter().map(|p| p.id().to_string()).collect();
    assert!(available.contains(&"p1".to_string()));
}

#[tokio::test]
async fn refresh_preserves_breaker_state_for_surviving_proxy_ids() {
    let registry = ProxyRegistry::new(small_pool(), RegistryConfig::default());
    for _ in 0..5 {
        registry.report_failure("p1", "timeout").await;
    }
    assert!(registry.breaker_for("p1").await.unwrap().lock().await.state != scrapecore::CircuitState::Closed);

    registry.refresh(small_pool()).await;
    let breaker = registry.breaker_for("p1").await.unwrap();
    assert_ne!(breaker.lock().await.state, scrapecore::CircuitState::Closed);
}

// ============================================================================
// Rotation strategies over a shared pool
// ============================================================================

fn proxies_from(descriptors: &[ProxyDescriptor]) -> Vec<Proxy> {
    descriptors.iter().cloned().map(Proxy::new).collect()
}

#[tokio::test]
async fn round_robin_visits_every_proxy_before_repeating() {
    let pool = proxies_from(&small_pool());
    let rr = RoundRobin::new();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..pool.len() {
        let picked = rr.select(&pool).unwrap();
        seen.insert(picked.id().to_string());
    }
    assert_eq!(seen.len(), pool.len());
}

#[tokio::test]
async fn weighted_selection_favors_higher_weight_over_many_draws() {
    let pool = proxies_from(&small_pool());
    let mut counts = std::collections::HashMap::new();
    for _ in 0..500 {
        let picked = select_weighted(&pool).unwrap();
        *counts.entry(picked.id().to_string()).or_insert(0u32) += 1;
    }
    assert!(counts["p3"] > counts["p1"]);
    assert!(counts["p3"] > counts["p2"]);
}

#[tokio::test]
async fn performance_based_selection_prefers_the_proxy_with_better_ema_scores() {
    let pool = proxies_from(&small_pool());
    let tracker = PerformanceTracker::new();
    for _ in 0..10 {
        tracker.update("p1", Duration::from_millis(500), scrapecore::Outcome::Failure, None).await;
        tracker.update("p2", Duration::from_millis(20), scrapecore::Outcome::Success, Some(0.95)).await;
    }
    let picked = select_performance_based(&pool, &tracker).await.unwrap();
    assert_eq!(picked.id(), "p2");
}
