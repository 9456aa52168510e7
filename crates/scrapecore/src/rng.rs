//! Process-wide RNG seeding. The rest of the crate keeps using `rand`'s
//! thread-local generator for selection jitter; this module only governs how
//! that generator's seed source is chosen at startup, and is never consulted
//! for security-sensitive decisions.

use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

const STRICT_ENV_VAR: &str = "DATASCRAPEXTER_SECURITY_STRICT";

#[derive(Debug)]
pub enum SeedError {
    EntropyUnavailable,
}

/// Draws a seed from the OS entropy source. In strict mode (the env var set
/// to a truthy value) this is the only path: failure propagates to the
/// caller. Otherwise a failure degrades to a time-mixed seed with a warning.
pub fn seed_process_rng() -> Result<[u8; 32], SeedError> {
    let strict = std::env::var(STRICT_ENV_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    match try_os_entropy() {
        Ok(seed) => Ok(seed),
        Err(e) if strict => Err(e),
        Err(_) => {
            warn!("cryptographic entropy unavailable, degrading to time-mixed RNG seed");
            Ok(degraded_seed())
        }
    }
}

fn try_os_entropy() -> Result<[u8; 32], SeedError> {
    let mut seed = [0u8; 32];
    OsRng.try_fill_bytes(&mut seed).map_err(|_| SeedError::EntropyUnavailable)?;
    Ok(seed)
}

fn degraded_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let bytes = nanos.to_le_bytes();
    for (i, b) in seed.iter_mut().enumerate() {
        *b = bytes[i % bytes.len()] ^ (i as u8);
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_seed_is_deterministic_function_of_time() {
        let a = degraded_seed();
        let b = degraded_seed();
        // Not asserting equality (time advances); just that it's full-width.
        assert_eq!(a.len(), 32);
        assert_eq!(b.len(), 32);
    }

    #[test]
    fn non_strict_seeding_always_succeeds() {
        std::env::remove_var(STRICT_ENV_VAR);
        assert!(seed_process_rng().is_ok());
    }
}
