use envconfig::Envconfig;
use std::net::SocketAddr;

use crate::error::{ApiError, Result};

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Line width text is justified to
    #[envconfig(from = "JUSTIFY_WIDTH", default = "80")]
    pub justify_width: usize,

    /// Token time-to-live in seconds
    #[envconfig(from = "TOKEN_TTL_SECS", default = "86400")]
    pub token_ttl_secs: u64,

    /// Live tokens allowed per identity before eviction
    #[envconfig(from = "MAX_TOKENS_PER_IDENTITY", default = "5")]
    pub max_tokens_per_identity: usize,

    /// Word budget per token per window
    #[envconfig(from = "DAILY_WORD_LIMIT", default = "80000")]
    pub daily_word_limit: u64,

    /// Sliding window size in seconds
    #[envconfig(from = "WINDOW_SECS", default = "86400")]
    pub window_secs: u64,

    /// Token registry sweep interval in seconds
    #[envconfig(from = "REGISTRY_SWEEP_SECS", default = "3600")]
    pub registry_sweep_secs: u64,

    /// Usage sweep interval in seconds
    #[envconfig(from = "LIMITER_SWEEP_SECS", default = "14400")]
    pub limiter_sweep_secs: u64,

    /// Server-side tag mixed into token derivation
    #[envconfig(from = "TOKEN_ISSUER_TAG", default = "justifier")]
    pub token_issuer_tag: String,

    /// Default log level when RUST_LOG is unset
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> std::result::Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    /// Reject configurations the core cannot operate under.
    pub fn validate(&self) -> Result<()> {
        if self.justify_width == 0 {
            return Err(ApiError::Validation(
                "JUSTIFY_WIDTH must be positive".to_string(),
            ));
        }
        if self.token_ttl_secs == 0 {
            return Err(ApiError::Validation(
                "TOKEN_TTL_SECS must be positive".to_string(),
            ));
        }
        if self.max_tokens_per_identity == 0 {
            return Err(ApiError::Validation(
                "MAX_TOKENS_PER_IDENTITY must be positive".to_string(),
            ));
        }
        if self.daily_word_limit == 0 {
            return Err(ApiError::Validation(
                "DAILY_WORD_LIMIT must be positive".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(ApiError::Validation(
                "WINDOW_SECS must be positive".to_string(),
            ));
        }
        if self.registry_sweep_secs == 0 || self.limiter_sweep_secs == 0 {
            return Err(ApiError::Validation(
                "sweep intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
