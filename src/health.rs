use serde::Serialize;
use std::time::SystemTime;

use crate::error::Result;
use crate::rate_limiter::{RateLimiter, UsageStats};
use crate::registry::{RegistryStats, TokenRegistry};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub tokens: RegistryStats,
    pub usage: UsageStats,
}

#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub tokens: RegistryStats,
    pub usage: UsageStats,
}

static START_TIME: std::sync::LazyLock<SystemTime> = std::sync::LazyLock::new(SystemTime::now);

/// Read-only introspection over the registry and the limiter.
#[derive(Clone)]
pub struct HealthChecker {
    registry: TokenRegistry,
    limiter: RateLimiter,
}

impl HealthChecker {
    pub fn new(registry: TokenRegistry, limiter: RateLimiter) -> Self {
        Self { registry, limiter }
    }

    pub fn check_health(&self) -> Result<HealthStatus> {
        let now = SystemTime::now();
        let uptime = now.duration_since(*START_TIME).unwrap_or_default().as_secs();

        Ok(HealthStatus {
            status: "healthy".to_string(),
            timestamp: now
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            tokens: self.registry.stats()?,
            usage: self.limiter.stats()?,
        })
    }

    pub fn stats(&self) -> Result<ServiceStats> {
        Ok(ServiceStats {
            tokens: self.registry.stats()?,
            usage: self.limiter.stats()?,
        })
    }
}
