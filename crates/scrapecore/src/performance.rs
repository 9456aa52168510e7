//! Exponential-moving-average performance tracking per proxy.

use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const EMA_ALPHA: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub error_rate: f64,
    pub timeout_rate: f64,
    pub data_quality: f64,
    pub sample_size: u64,
    pub last_measured: Instant,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            success_rate: 100.0,
            avg_latency_ms: 0.0,
            error_rate: 0.0,
            timeout_rate: 0.0,
            data_quality: 1.0,
            sample_size: 0,
            last_measured: Instant::now(),
        }
    }
}

fn ema(previous: f64, sample: f64) -> f64 {
    previous * (1.0 - EMA_ALPHA) + sample * EMA_ALPHA
}

#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

pub struct PerformanceTracker {
    metrics: RwLock<FxHashMap<String, PerformanceMetrics>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(FxHashMap::default()),
        }
    }

    pub async fn update(&self, proxy_id: &str, latency: Duration, outcome: Outcome, quality: Option<f64>) {
        let mut map = self.metrics.write().await;
        let m = map.entry(proxy_id.to_string()).or_default();

        let success_sample = match outcome {
            Outcome::Success => 100.0,
            Outcome::Failure | Outcome::Timeout => 0.0,
        };
        m.success_rate = ema(m.success_rate, success_sample);
        m.avg_latency_ms = if m.sample_size == 0 {
            latency.as_millis() as f64
        } else {
            ema(m.avg_latency_ms, latency.as_millis() as f64)
        };

        match outcome {
            Outcome::Failure => m.error_rate = ema(m.error_rate, 100.0),
            Outcome::Timeout => m.timeout_rate = ema(m.timeout_rate, 100.0),
            Outcome::Success => {
                m.error_rate = ema(m.error_rate, 0.0);
                m.timeout_rate = ema(m.timeout_rate, 0.0);
            }
        }

        if let Some(q) = quality {
            m.data_quality = ema(m.data_quality, q);
        }

        m.sample_size += 1;
        m.last_measured = Instant::now();
    }

    pub async fn get(&self, proxy_id: &str) -> Option<PerformanceMetrics> {
        self.metrics.read().await.get(proxy_id).cloned()
    }

    /// Composite score in [0, 100] per the weighted-sub-score formula.
    pub async fn composite_score(&self, proxy_id: &str) -> f64 {
        let Some(m) = self.get(proxy_id).await else {
            return 50.0; // neutral prior for proxies with no samples yet
        };
        let latency_score = (100.0 - m.avg_latency_ms / 10.0).max(0.0);
        let throughput_score = (100.0 - m.timeout_rate).max(0.0);
        let reliability_score = (100.0 - m.error_rate).max(0.0);
        let quality_score = m.data_quality * 100.0;

        0.25 * latency_score
            + 0.25 * m.success_rate
            + 0.15 * throughput_score
            + 0.20 * quality_score
            + 0.15 * reliability_score
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
