//! Config surface: `serde`-deserializable types mirroring the YAML schema an
//! external loader would populate. This crate never parses YAML itself; it
//! only defines the shape and the defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub proxy: ProxyConfig,
    pub pipeline: PipelineSurfaceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { proxy: ProxyConfig::default(), pipeline: PipelineSurfaceConfig::default() }
    }
}

/// Rotation strategy names accepted on the config surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategyKind {
    RoundRobin,
    Random,
    Weighted,
    Healthy,
    Geographic,
    Performance,
    LatencyBased,
    LoadBalanced,
    FailoverGroup,
    TimezoneBased,
    CostOptimized,
    MlPredictive,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProxyConfig {
    /// Enable the proxy subsystem at all.
    pub enabled: bool,
    pub rotation: RotationStrategyKind,
    pub health_check: bool,
    /// Interval between health-prober ticks, in seconds.
    #[validate(range(min = 1))]
    pub health_check_rate_secs: u64,
    #[validate(url)]
    pub health_check_url: String,
    /// Per-operation and per-proxy timeout, in seconds.
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    #[validate(range(min = 1))]
    pub failure_threshold: u32,
    /// Recovery window before an unavailable proxy is retried, in seconds.
    pub recovery_time_secs: u64,
    /// Circuit breaker reset timeout, in seconds.
    pub circuit_breaker_reset_secs: u64,
    #[validate(nested)]
    pub providers: Vec<ProxyProviderConfig>,
    pub tls: TlsConfig,
    pub geographic_preference: Vec<String>,
    pub cost_budget: Option<f64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rotation: RotationStrategyKind::RoundRobin,
            health_check: true,
            health_check_rate_secs: 30,
            health_check_url: "http://httpbin.org/ip".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 100,
            failure_threshold: 5,
            recovery_time_secs: 300,
            circuit_breaker_reset_secs: 60,
            providers: vec![],
            tls: TlsConfig::default(),
            geographic_preference: vec![],
            cost_budget: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProxyProviderConfig {
    #[validate(length(min = 1))]
    pub name: String,
    pub proxy_type: String,
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub weight: Option<u32>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub insecure_skip_verify: bool,
    pub server_name: Option<String>,
    pub root_cas: Vec<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            server_name: None,
            root_cas: vec![],
            client_cert: None,
            client_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSurfaceConfig {
    pub validation_strict_mode: bool,
    pub deduplication_method: String,
    pub deduplication_fields: Vec<String>,
    pub deduplication_threshold: f64,
    pub deduplication_cache_size: usize,
    pub enrichment_timeout_secs: u64,
    pub enrichment_parallel: bool,
    /// Arbitrary field-specific transform rule parameters, keyed by field
    /// name, forwarded verbatim to `pipeline::transform`.
    pub fields: HashMap<String, Vec<HashMap<String, String>>>,
}

impl Default for PipelineSurfaceConfig {
    fn default() -> Self {
        Self {
            validation_strict_mode: true,
            deduplication_method: "hash".to_string(),
            deduplication_fields: vec![],
            deduplication_threshold: 0.9,
            deduplication_cache_size: 10_000,
            enrichment_timeout_secs: 5,
            enrichment_parallel: false,
            fields: HashMap::new(),
        }
    }
}

/// Maps CLI-facing exit codes to `CoreError` variants, documented as a
/// contract for the wrapper binary that owns the actual `std::process::exit`.
pub fn exit_code_for(error: &crate::error::CoreError) -> i32 {
    use crate::error::CoreError::*;
    match error {
        NoProxyAvailable | CircuitOpen { .. } => 3,
        RetryExhausted { .. } => 3,
        FallbackFailed { .. } => 3,
        Config(_) => 2,
        Transform { .. } => 4,
        Validation { .. } => 6,
        Cancelled => 1,
    }
}
