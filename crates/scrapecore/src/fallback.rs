//! Fallback strategies consulted once retries (and the circuit breaker) rule
//! out any further attempt.

use serde_json::Value;

#[derive(Debug, Clone)]
pub enum FallbackKind {
    Default(Value),
    Cached,
    Alternative(AlternativeRoute),
    Degrade(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternativeRoute {
    MobileVersion,
    ApiFallback,
    CachedAlternative,
    Custom,
}

impl FallbackKind {
    pub fn label(&self) -> &'static str {
        match self {
            FallbackKind::Default(_) => "default",
            FallbackKind::Cached => "cached",
            FallbackKind::Alternative(_) => "alternative",
            FallbackKind::Degrade(_) => "degrade",
        }
    }
}
