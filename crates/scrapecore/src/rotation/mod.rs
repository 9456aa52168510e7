//! Rotation strategies: pure selection functions over the available proxy set.

mod geographic;

pub use geographic::{GeoContext, GeographicSelector};

use crate::cost::CostTracker;
use crate::performance::PerformanceTracker;
use crate::proxy::Proxy;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct ProxyGroup {
    pub name: String,
    pub priority: u32,
    pub group_type: GroupType,
    pub member_ids: Vec<String>,
    pub max_failures: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupType {
    Primary,
    Secondary,
    Emergency,
}

#[derive(Debug)]
pub enum NoProxyAvailable {
    EmptyPool,
}

/// Context a caller may supply to strategies that need it (geographic,
/// load-balanced). Absent fields simply disable that refinement.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    pub target_host: Option<String>,
}

pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self { cursor: AtomicUsize::new(0) }
    }

    pub fn select(&self, available: &[Proxy]) -> Result<Proxy, NoProxyAvailable> {
        if available.is_empty() {
            return Err(NoProxyAvailable::EmptyPool);
        }
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % available.len();
        Ok(available[idx].clone())
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

pub fn select_random(available: &[Proxy]) -> Result<Proxy, NoProxyAvailable> {
    if available.is_empty() {
        return Err(NoProxyAvailable::EmptyPool);
    }
    let idx = rand::thread_rng().gen_range(0..available.len());
    Ok(available[idx].clone())
}

pub fn select_weighted(available: &[Proxy]) -> Result<Proxy, NoProxyAvailable> {
    if available.is_empty() {
        return Err(NoProxyAvailable::EmptyPool);
    }
    let total: u32 = available.iter().map(|p| p.descriptor.weight.max(1)).sum();
    let mut target = rand::thread_rng().gen_range(0..total);
    for proxy in available {
        let w = proxy.descriptor.weight.max(1);
        if target < w {
            return Ok(proxy.clone());
        }
        target -= w;
    }
    Ok(available[available.len() - 1].clone())
}

pub async fn select_healthy(available: &[Proxy]) -> Result<Proxy, NoProxyAvailable> {
    if available.is_empty() {
        return Err(NoProxyAvailable::EmptyPool);
    }
    let mut scored = Vec::with_capacity(available.len());
    for p in available {
        let status = p.status.lock().await;
        scored.push((status.avg_response_time, p.clone()));
    }
    scored.sort_by_key(|(latency, _)| *latency);
    Ok(scored.remove(0).1)
}

pub async fn select_latency_based(available: &[Proxy]) -> Result<Proxy, NoProxyAvailable> {
    select_healthy(available).await
}

pub async fn select_performance_based(
    available: &[Proxy],
    tracker: &PerformanceTracker,
) -> Result<Proxy, NoProxyAvailable> {
    if available.is_empty() {
        return Err(NoProxyAvailable::EmptyPool);
    }
    let mut best: Option<(f64, Proxy)> = None;
    for p in available {
        let score = tracker.composite_score(p.id()).await;
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, p.clone()));
        }
    }
    Ok(best.unwrap().1)
}

pub async fn select_cost_optimized(
    available: &[Proxy],
    costs: &CostTracker,
    performance: &PerformanceTracker,
) -> Result<Proxy, NoProxyAvailable> {
    if available.is_empty() {
        return Err(NoProxyAvailable::EmptyPool);
    }
    let candidates: Vec<&Proxy> = if costs.over_budget().await {
        let free: Vec<&Proxy> = available
            .iter()
            .filter(|p| p.descriptor.cost_per_request.unwrap_or(0.0) == 0.0)
            .collect();
        if free.is_empty() { available.iter().collect() } else { free }
    } else {
        available.iter().collect()
    };

    let mut best: Option<(f64, Proxy)> = None;
    for p in candidates {
        let score = performance.composite_score(p.id()).await.max(0.01);
        let cost = p.descriptor.cost_per_request.unwrap_or(0.0);
        let ratio = cost / score;
        if best.as_ref().map(|(r, _)| ratio < *r).unwrap_or(true) {
            best = Some((ratio, p.clone()));
        }
    }
    Ok(best.unwrap().1)
}

pub async fn select_failover_group(
    available: &[Proxy],
    groups: &[ProxyGroup],
    performance: &PerformanceTracker,
) -> Result<Proxy, NoProxyAvailable> {
    let mut sorted_groups: Vec<&ProxyGroup> = groups.iter().filter(|g| g.enabled).collect();
    sorted_groups.sort_by_key(|g| g.priority);

    for group in sorted_groups {
        let members: Vec<&Proxy> = available
            .iter()
            .filter(|p| group.member_ids.contains(&p.descriptor.id))
            .collect();
        if members.is_empty() {
            continue;
        }
        let mut best: Option<(f64, Proxy)> = None;
        for p in members {
            let score = performance.composite_score(p.id()).await;
            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, p.clone()));
            }
        }
        if let Some((_, proxy)) = best {
            return Ok(proxy);
        }
    }
    Err(NoProxyAvailable::EmptyPool)
}

/// Least-connections variant of load balancing; the executor updates
/// `connections` on acquire/release of a proxy.
pub async fn select_load_balanced(
    available: &[Proxy],
    connections: &RwLock<HashMap<String, u32>>,
) -> Result<Proxy, NoProxyAvailable> {
    if available.is_empty() {
        return Err(NoProxyAvailable::EmptyPool);
    }
    let conns = connections.read().await;
    let mut best: Option<(u32, Proxy)> = None;
    for p in available {
        let count = conns.get(p.id()).copied().unwrap_or(0);
        if best.as_ref().map(|(c, _)| count < *c).unwrap_or(true) {
            best = Some((count, p.clone()));
        }
    }
    Ok(best.unwrap().1)
}
