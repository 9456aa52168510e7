pub mod cancel;
pub mod circuit_breaker;
pub mod client;
pub mod config;
pub mod cost;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod health_prober;
pub mod http_client;
pub mod performance;
pub mod pipeline;
pub mod proxy;
pub mod registry;
pub mod result_cache;
pub mod rng;
pub mod rotation;

pub use cancel::CancellationToken;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::ScrapeCore;
pub use config::{AppConfig, PipelineSurfaceConfig, ProxyConfig, ProxyProviderConfig, RotationStrategyKind, TlsConfig};
pub use cost::{CostTracker, ProxyCost};
pub use error::{is_retryable, CoreError};
pub use executor::{ExecutionResult, OperationConfig, ResilientExecutor, RetryConfig};
pub use fallback::{AlternativeRoute, FallbackKind};
pub use health_prober::{HealthProber, HealthProberConfig};
pub use http_client::HttpClient;
pub use performance::{Outcome, PerformanceMetrics, PerformanceTracker};
pub use pipeline::{FieldTransformSpec, PipelineConfig, PipelineOrchestrator, ProcessedRecord, RecordError, RecordMetadata};
pub use proxy::{GeoLocation, Proxy, ProxyDescriptor, ProxyStatus, ProxyType};
pub use registry::{ManagerStats, ProxyRegistry, RegistryConfig};
pub use result_cache::ResultCache;
pub use rng::seed_process_rng;
pub use rotation::{
    select_cost_optimized, select_failover_group, select_healthy, select_latency_based, select_load_balanced, select_performance_based,
    select_random, select_weighted, GeoContext, GeographicSelector, GroupType, NoProxyAvailable, ProxyGroup, RoundRobin, SelectionContext,
};
