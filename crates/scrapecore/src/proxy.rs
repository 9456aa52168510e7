//! Proxy descriptors and their mutable runtime status.
//!
//! A [`Proxy`] is an immutable descriptor plus a [`ProxyStatus`] guarded by a
//! mutex owned by that proxy. Nothing outside [`crate::registry::ProxyRegistry`]
//! should mutate status directly.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Http,
    Https,
    Socks5,
}

impl ProxyType {
    fn scheme(self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::Socks5 => "socks5",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub country: String,
    pub continent: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyDescriptor {
    pub id: String,
    pub proxy_type: ProxyType,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub geo: Option<GeoLocation>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cost_per_request: Option<f64>,
    pub max_concurrent: Option<u32>,
}

fn default_weight() -> u32 {
    1
}

impl ProxyDescriptor {
    /// Wire format accepted by the fetcher: `{scheme}://[user:pass@]host:port`.
    pub fn to_url(&self) -> String {
        let scheme = self.proxy_type.scheme();
        let auth = match (&self.username, &self.password) {
            (Some(user), Some(pass)) => format!("{}:{}@", user, pass),
            (Some(user), None) => format!("{}@", user),
            _ => String::new(),
        };
        format!("{}://{}{}:{}", scheme, auth, self.host, self.port)
    }
}

/// Mutable, per-proxy runtime state. Guarded by a mutex owned by the [`Proxy`].
#[derive(Debug, Clone)]
pub struct ProxyStatus {
    pub available: bool,
    pub last_checked: Option<Instant>,
    pub last_success: Option<Instant>,
    pub last_failure: Option<Instant>,
    pub failure_count: u32,
    pub use_count: u64,
    pub current_connections: u32,
    pub avg_response_time: Duration,
}

impl Default for ProxyStatus {
    fn default() -> Self {
        Self {
            available: true,
            last_checked: None,
            last_success: None,
            last_failure: None,
            failure_count: 0,
            use_count: 0,
            current_connections: 0,
            avg_response_time: Duration::from_millis(0),
        }
    }
}

/// A proxy and the mutex-guarded status that the registry mutates.
#[derive(Debug, Clone)]
pub struct Proxy {
    pub descriptor: Arc<ProxyDescriptor>,
    pub status: Arc<Mutex<ProxyStatus>>,
}

impl Proxy {
    pub fn new(descriptor: ProxyDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            status: Arc::new(Mutex::new(ProxyStatus::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}
