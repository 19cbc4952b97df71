//! Sliding-window word-count rate limiter.
//!
//! Each token owns an append-only list of (words, timestamp) samples.
//! Only samples newer than `now - window` count toward usage; the
//! periodic sweep prunes the rest. A denied check is a normal decision
//! value, not an error.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Copy)]
struct UsageSample {
    words: u64,
    timestamp: u64,
}

/// Outcome of a limit check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LimitDecision {
    pub allowed: bool,
    pub remaining_words: u64,
    /// Unix time at which the oldest in-window sample leaves the window.
    pub reset_at: u64,
    pub current_usage: u64,
}

/// Aggregate usage counts for introspection endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub tracked_tokens: u64,
    pub words_in_window: u64,
}

#[derive(Clone)]
pub struct RateLimiter {
    window_secs: u64,
    daily_limit: u64,
    usage: Arc<RwLock<HashMap<String, Vec<UsageSample>>>>,
}

impl RateLimiter {
    pub fn new(window_secs: u64, daily_limit: u64) -> Self {
        Self {
            window_secs,
            daily_limit,
            usage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    /// Would consuming `words` stay within the budget? Read-only.
    pub fn check_limit(&self, token: &str, words: u64) -> Result<LimitDecision> {
        self.check_limit_at(token, words, unix_now())
    }

    fn check_limit_at(&self, token: &str, words: u64, now: u64) -> Result<LimitDecision> {
        let usage = self
            .usage
            .read()
            .map_err(|_| ApiError::Internal("usage lock poisoned".to_string()))?;
        Ok(self.decide(usage.get(token).map(Vec::as_slice).unwrap_or(&[]), words, now))
    }

    /// Append a sample stamped now. Enforcement is the caller's job:
    /// check first, record only on confirmed success.
    pub fn record_usage(&self, token: &str, words: u64) -> Result<()> {
        self.record_usage_at(token, words, unix_now())
    }

    fn record_usage_at(&self, token: &str, words: u64, now: u64) -> Result<()> {
        let mut usage = self.write()?;
        usage
            .entry(token.to_string())
            .or_default()
            .push(UsageSample {
                words,
                timestamp: now,
            });
        Ok(())
    }

    /// Check and record under a single lock hold. Nothing is recorded
    /// when the check fails; on success the returned decision reflects
    /// the quota after recording.
    pub fn consume_words(&self, token: &str, words: u64) -> Result<LimitDecision> {
        self.consume_words_at(token, words, unix_now())
    }

    fn consume_words_at(&self, token: &str, words: u64, now: u64) -> Result<LimitDecision> {
        let mut usage = self.write()?;
        let samples = usage.entry(token.to_string()).or_default();

        let decision = self.decide(samples, words, now);
        if !decision.allowed {
            return Ok(decision);
        }

        samples.push(UsageSample {
            words,
            timestamp: now,
        });
        Ok(self.decide(samples, 0, now))
    }

    /// Clear all samples for a token.
    pub fn reset_usage(&self, token: &str) -> Result<()> {
        let mut usage = self.write()?;
        usage.remove(token);
        Ok(())
    }

    /// Drop out-of-window samples and empty token entries; returns how
    /// many samples were removed.
    pub fn sweep(&self) -> Result<usize> {
        self.sweep_at(unix_now())
    }

    fn sweep_at(&self, now: u64) -> Result<usize> {
        let cutoff = now.saturating_sub(self.window_secs);
        let mut usage = self.write()?;

        let before: usize = usage.values().map(Vec::len).sum();
        for samples in usage.values_mut() {
            samples.retain(|s| s.timestamp > cutoff);
        }
        usage.retain(|_, samples| !samples.is_empty());
        let after: usize = usage.values().map(Vec::len).sum();
        Ok(before - after)
    }

    pub fn stats(&self) -> Result<UsageStats> {
        self.stats_at(unix_now())
    }

    fn stats_at(&self, now: u64) -> Result<UsageStats> {
        let cutoff = now.saturating_sub(self.window_secs);
        let usage = self
            .usage
            .read()
            .map_err(|_| ApiError::Internal("usage lock poisoned".to_string()))?;
        let words_in_window = usage
            .values()
            .flatten()
            .filter(|s| s.timestamp > cutoff)
            .map(|s| s.words)
            .sum();
        Ok(UsageStats {
            tracked_tokens: usage.len() as u64,
            words_in_window,
        })
    }

    fn decide(&self, samples: &[UsageSample], words: u64, now: u64) -> LimitDecision {
        let cutoff = now.saturating_sub(self.window_secs);
        let in_window = samples.iter().filter(|s| s.timestamp > cutoff);

        let mut current_usage = 0u64;
        let mut oldest: Option<u64> = None;
        for sample in in_window {
            current_usage += sample.words;
            oldest = Some(oldest.map_or(sample.timestamp, |t| t.min(sample.timestamp)));
        }

        LimitDecision {
            allowed: current_usage + words <= self.daily_limit,
            remaining_words: self.daily_limit.saturating_sub(current_usage),
            reset_at: oldest.map_or(now + self.window_secs, |t| t + self.window_secs),
            current_usage,
        }
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<UsageSample>>>> {
        self.usage
            .write()
            .map_err(|_| ApiError::Internal("usage lock poisoned".to_string()))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
