//! Per-proxy spend tracking and budget enforcement.

use rustc_hash::FxHashMap;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct ProxyCost {
    pub request_count: u64,
    pub total_cost: f64,
}

pub struct CostTracker {
    per_proxy: RwLock<FxHashMap<String, ProxyCost>>,
    current_spend: RwLock<f64>,
    budget: Option<f64>,
    period_start: RwLock<Instant>,
}

impl CostTracker {
    pub fn new(budget: Option<f64>) -> Self {
        Self {
            per_proxy: RwLock::new(FxHashMap::default()),
            current_spend: RwLock::new(0.0),
            budget,
            period_start: RwLock::new(Instant::now()),
        }
    }

    pub async fn record(&self, proxy_id: &str, cost: f64) {
        let mut per_proxy = self.per_proxy.write().await;
        let entry = per_proxy.entry(proxy_id.to_string()).or_default();
        entry.request_count += 1;
        entry.total_cost += cost;
        *self.current_spend.write().await += cost;
    }

    pub async fn over_budget(&self) -> bool {
        match self.budget {
            Some(budget) => *self.current_spend.read().await >= budget,
            None => false,
        }
    }

    pub async fn cost_for(&self, proxy_id: &str) -> f64 {
        self.per_proxy
            .read()
            .await
            .get(proxy_id)
            .map(|c| c.total_cost)
            .unwrap_or(0.0)
    }

    pub async fn reset_period(&self) {
        *self.current_spend.write().await = 0.0;
        *self.per_proxy.write().await = FxHashMap::default();
        *self.period_start.write().await = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn over_budget_trips_once_threshold_crossed() {
        let tracker = CostTracker::new(Some(1.0));
        tracker.record("p1", 0.6).await;
        assert!(!tracker.over_budget().await);
        tracker.record("p1", 0.5).await;
        assert!(tracker.over_budget().await);
    }

    #[tokio::test]
    async fn no_budget_never_trips() {
        let tracker = CostTracker::new(None);
        tracker.record("p1", 1000.0).await;
        assert!(!tracker.over_budget().await);
    }
}
