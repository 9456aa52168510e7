//! Proxy Registry: the canonical set of proxies and their health/availability.

use crate::circuit_breaker::CircuitBreaker;
use crate::proxy::{Proxy, ProxyDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub failure_threshold: u32,
    pub recovery_time: Duration,
    pub breaker_reset_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_time: Duration::from_secs(300),
            breaker_reset_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManagerStats {
    pub total: usize,
    pub healthy: usize,
    pub failed: usize,
    pub avg_success_rate: f64,
    pub avg_response_time_ms: f64,
}

/// Holds every configured proxy plus its per-proxy circuit breaker.
pub struct ProxyRegistry {
    proxies: RwLock<HashMap<String, Proxy>>,
    breakers: RwLock<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
    config: RegistryConfig,
}

impl ProxyRegistry {
    pub fn new(descriptors: Vec<ProxyDescriptor>, config: RegistryConfig) -> Self {
        let mut proxies = HashMap::new();
        let mut breakers = HashMap::new();
        for d in descriptors {
            let id = d.id.clone();
            breakers.insert(
                id.clone(),
                Arc::new(Mutex::new(CircuitBreaker::new(
                    id.clone(),
                    config.failure_threshold,
                    config.breaker_reset_timeout,
                ))),
            );
            proxies.insert(id, Proxy::new(d));
        }
        Self {
            proxies: RwLock::new(proxies),
            breakers: RwLock::new(breakers),
            config,
        }
    }

    pub async fn breaker_for(&self, proxy_id: &str) -> Option<Arc<Mutex<CircuitBreaker>>> {
        self.breakers.read().await.get(proxy_id).cloned()
    }

    /// Proxies currently eligible for selection: available, under the failure
    /// threshold, circuit not open, and under their concurrency cap. Proxies
    /// unavailable past `recovery_time` are optimistically re-enabled first.
    pub async fn list_available(&self) -> Vec<Proxy> {
        let proxies = self.proxies.read().await;
        let mut out = Vec::with_capacity(proxies.len());
        for proxy in proxies.values() {
            let mut status = proxy.status.lock().await;
            if !status.available {
                if let Some(last_failure) = status.last_failure {
                    if last_failure.elapsed() >= self.config.recovery_time {
                        info!("proxy '{}' re-enabled after recovery window", proxy.id());
                        status.available = true;
                        status.failure_count = 0;
                    }
                }
            }
            if !status.available {
                continue;
            }
            if status.failure_count >= self.config.failure_threshold {
                continue;
            }
            if let Some(max) = proxy.descriptor.max_concurrent {
                if status.current_connections >= max {
                    continue;
                }
            }
            drop(status);
            if let Some(breaker) = self.breaker_for(proxy.id()).await {
                if !breaker.lock().await.can_execute() {
                    continue;
                }
            }
            out.push(proxy.clone());
        }
        out
    }

    pub async fn report_success(&self, proxy_id: &str) {
        let proxies = self.proxies.read().await;
        if let Some(proxy) = proxies.get(proxy_id) {
            let mut status = proxy.status.lock().await;
            status.available = true;
            status.last_success = Some(Instant::now());
            status.use_count += 1;
        }
        if let Some(breaker) = self.breaker_for(proxy_id).await {
            breaker.lock().await.record_success();
        }
    }

    pub async fn report_failure(&self, proxy_id: &str, error: &str) {
        let proxies = self.proxies.read().await;
        if let Some(proxy) = proxies.get(proxy_id) {
            let mut status = proxy.status.lock().await;
            status.failure_count += 1;
            status.last_failure = Some(Instant::now());
            if status.failure_count >= self.config.failure_threshold {
                status.available = false;
                warn!("proxy '{}' marked unavailable: {}", proxy_id, error);
            } else {
                debug!("proxy '{}' failure {}/{}: {}", proxy_id, status.failure_count, self.config.failure_threshold, error);
            }
        }
        if let Some(breaker) = self.breaker_for(proxy_id).await {
            breaker.lock().await.record_failure();
        }
    }

    pub async fn get_stats(&self) -> ManagerStats {
        let proxies = self.proxies.read().await;
        let mut stats = ManagerStats {
            total: proxies.len(),
            ..Default::default()
        };
        let mut rate_sum = 0.0;
        let mut latency_sum = 0.0;
        let mut sampled = 0usize;
        for proxy in proxies.values() {
            let status = proxy.status.lock().await;
            if status.available {
                stats.healthy += 1;
            } else {
                stats.failed += 1;
            }
            if status.use_count > 0 {
                sampled += 1;
                let success = status.use_count.saturating_sub(status.failure_count as u64);
                rate_sum += success as f64 / status.use_count as f64 * 100.0;
                latency_sum += status.avg_response_time.as_millis() as f64;
            }
        }
        if sampled > 0 {
            stats.avg_success_rate = rate_sum / sampled as f64;
            stats.avg_response_time_ms = latency_sum / sampled as f64;
        }
        stats
    }

    /// Replace the managed proxy set, preserving breakers for ids that persist.
    pub async fn refresh(&self, descriptors: Vec<ProxyDescriptor>) {
        let mut proxies = self.proxies.write().await;
        let mut breakers = self.breakers.write().await;
        let mut next = HashMap::with_capacity(descriptors.len());
        for d in descriptors {
            let id = d.id.clone();
            if !breakers.contains_key(&id) {
                breakers.insert(
                    id.clone(),
                    Arc::new(Mutex::new(CircuitBreaker::new(
                        id.clone(),
                        self.config.failure_threshold,
                        self.config.breaker_reset_timeout,
                    ))),
                );
            }
            next.insert(id, Proxy::new(d));
        }
        breakers.retain(|id, _| next.contains_key(id));
        *proxies = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyType;

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

    #[tokio::test]
    async fn failure_past_threshold_marks_unavailable() {
        let registry = ProxyRegistry::new(vec![descriptor("p1")], RegistryConfig::default());
        for _ in 0..5 {
            registry.report_failure("p1", "boom").await;
        }
        let available = registry.list_available().await;
        assert!(available.is_empty());
    }

    #[tokio::test]
    async fn recovery_window_re_enables_proxy() {
        let mut config = RegistryConfig::default();
        config.recovery_time = Duration::from_millis(10);
        let registry = ProxyRegistry::new(vec![descriptor("p1")], config);
        for _ in 0..5 {
            registry.report_failure("p1", "boom").await;
        }
        assert!(registry.list_available().await.is_empty());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.list_available().await.len(), 1);
    }

    #[tokio::test]
    async fn success_does_not_reset_failure_count() {
        let registry = ProxyRegistry::new(vec![descriptor("p1")], RegistryConfig::default());
        registry.report_failure("p1", "boom").await;
        registry.report_failure("p1", "boom").await;
        registry.report_success("p1").await;
        let proxies = registry.proxies.read().await;
        let status = proxies.get("p1").unwrap().status.lock().await;
        assert_eq!(status.failure_count, 2);
        assert!(status.available);
    }
}
