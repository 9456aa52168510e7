//! Top-level facade wiring the Proxy Registry, a Rotation Strategy, the
//! Resilient Executor, and the Pipeline Orchestrator into the single
//! request/response flow: pick a proxy, run the fetch through the executor,
//! update trackers, hand the body to the pipeline.

use crate::cancel::CancellationToken;
use crate::config::{AppConfig, RotationStrategyKind};
use crate::cost::CostTracker;
use crate::error::CoreError;
use crate::executor::{ExecutionResult, OperationConfig, ResilientExecutor};
use crate::http_client::HttpClient;
use crate::performance::{Outcome, PerformanceTracker};
use crate::pipeline::{PipelineConfig, PipelineOrchestrator, ProcessedRecord};
use crate::proxy::{Proxy, ProxyDescriptor};
use crate::registry::{ProxyRegistry, RegistryConfig};
use crate::rotation::{self, RoundRobin};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Owns every subsystem needed to fetch through a rotated, resilient proxy
/// pool and run the result through the data pipeline. One instance per
/// scraping job; cheap to clone the pieces it hands out (`Arc` internally).
pub struct ScrapeCore {
    registry: Arc<ProxyRegistry>,
    executor: Arc<ResilientExecutor>,
    performance: Arc<PerformanceTracker>,
    cost: Arc<CostTracker>,
    pipeline: Arc<PipelineOrchestrator>,
    round_robin: RoundRobin,
    rotation: RotationStrategyKind,
    http: HttpClient,
}

impl ScrapeCore {
    pub fn new(descriptors: Vec<ProxyDescriptor>, config: AppConfig, pipeline: PipelineOrchestrator) -> anyhow::Result<Self> {
        let registry_config = RegistryConfig {
            failure_threshold: config.proxy.failure_threshold,
            recovery_time: Duration::from_secs(config.proxy.recovery_time_secs),
            breaker_reset_timeout: Duration::from_secs(config.proxy.circuit_breaker_reset_secs),
        };
        Ok(Self {
            registry: Arc::new(ProxyRegistry::new(descriptors, registry_config)),
            executor: Arc::new(ResilientExecutor::new(Duration::from_secs(300))),
            performance: Arc::new(PerformanceTracker::new()),
            cost: Arc::new(CostTracker::new(config.proxy.cost_budget)),
            pipeline: Arc::new(pipeline),
            round_robin: RoundRobin::new(),
            rotation: config.proxy.rotation,
            http: HttpClient::new()?,
        })
    }

    pub fn registry(&self) -> Arc<ProxyRegistry> {
        self.registry.clone()
    }

    async fn pick_proxy(&self) -> Result<Proxy, CoreError> {
        let available = self.registry.list_available().await;
        let picked = match self.rotation {
            RotationStrategyKind::RoundRobin => self.round_robin.select(&available),
            RotationStrategyKind::Random => rotation::select_random(&available),
            RotationStrategyKind::Weighted => rotation::select_weighted(&available),
            RotationStrategyKind::Healthy => rotation::select_healthy(&available).await,
            RotationStrategyKind::LatencyBased => rotation::select_latency_based(&available).await,
            RotationStrategyKind::Performance => rotation::select_performance_based(&available, &self.performance).await,
            RotationStrategyKind::CostOptimized => rotation::select_cost_optimized(&available, &self.cost, &self.performance).await,
            // Geographic/failover-group/load-balanced/timezone/ML-predictive strategies need
            // caller-supplied context (target country, group table, connection counts, historical
            // model) this facade doesn't own; callers needing those call the `rotation` functions
            // directly against `registry().list_available()`. Round-robin is the safe default here.
            _ => self.round_robin.select(&available),
        };
        picked.map_err(|_| CoreError::NoProxyAvailable)
    }

    /// Fetches `url` through a rotated proxy with retry/backoff/fallback,
    /// then runs the body through the pipeline. Returns the pipeline's
    /// `ProcessedRecord` plus the raw executor outcome for observability.
    pub async fn fetch_and_process(&self, url: &str, operation_name: &str, cancel: &CancellationToken) -> Result<(ProcessedRecord, ExecutionResult), CoreError> {
        let proxy = self.pick_proxy().await?;
        let proxy_id = proxy.id().to_string();

        self.executor
            .configure_operation(
                operation_name,
                OperationConfig { retry: Default::default(), fallback: None },
            )
            .await;

        let client = Arc::new(HttpClient::with_proxy(&proxy.descriptor).map_err(|e| CoreError::Config(e.to_string()))?);
        let url_owned = url.to_string();
        let started = Instant::now();

        let result = self
            .executor
            .execute(
                operation_name,
                || {
                    let client = client.clone();
                    let url = url_owned.clone();
                    async move { client.get_enhanced(&url).await.map(serde_json::Value::String).map_err(|e| e.to_string()) }
                },
                cancel,
            )
            .await;

        let elapsed = started.elapsed();
        let outcome = if result.success { Outcome::Success } else { Outcome::Failure };
        self.performance.update(&proxy_id, elapsed, outcome, None).await;
        if let Some(cost) = proxy.descriptor.cost_per_request {
            self.cost.record(&proxy_id, cost).await;
        }
        if result.success {
            self.registry.report_success(&proxy_id).await;
        } else {
            let reason = result.original_error.clone().unwrap_or_default();
            self.registry.report_failure(&proxy_id, &reason).await;
        }

        let body = match &result.value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                warn!("operation '{operation_name}' produced no body; running pipeline on empty input");
                String::new()
            }
        };

        let record = self.pipeline.process(body, operation_name.to_string()).await;
        Ok((record, result))
    }
}
