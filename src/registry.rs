//! In-memory token registry.
//!
//! Maps tokens to their owning identity with a TTL and a per-identity
//! cap. Records are flagged invalid on revocation, eviction, or expiry
//! and physically deleted by the periodic sweep. The identity index
//! tracks live tokens only.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ApiError, AuthErrorKind, Result};

/// A stored token and its identity binding.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub identity: String,
    pub created_at: u64,
    pub last_used: u64,
    pub valid: bool,
}

impl TokenRecord {
    fn is_expired(&self, now: u64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.created_at) >= ttl_secs
    }
}

/// Aggregate registry counts for introspection endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub active_tokens: u64,
    pub active_identities: u64,
}

#[derive(Default)]
struct RegistryInner {
    records: HashMap<String, TokenRecord>,
    by_identity: HashMap<String, Vec<String>>,
}

impl RegistryInner {
    fn drop_from_index(&mut self, identity: &str, token: &str) {
        if let Some(tokens) = self.by_identity.get_mut(identity) {
            tokens.retain(|t| t != token);
            if tokens.is_empty() {
                self.by_identity.remove(identity);
            }
        }
    }
}

#[derive(Clone)]
pub struct TokenRegistry {
    ttl_secs: u64,
    max_tokens_per_identity: usize,
    inner: Arc<RwLock<RegistryInner>>,
}

impl TokenRegistry {
    pub fn new(ttl_secs: u64, max_tokens_per_identity: usize) -> Self {
        Self {
            ttl_secs,
            max_tokens_per_identity,
            inner: Arc::new(RwLock::new(RegistryInner::default())),
        }
    }

    /// Store a freshly issued token, evicting the identity's oldest live
    /// token first when the per-identity cap is reached.
    pub fn store(&self, token: &str, identity: &str) -> Result<()> {
        self.store_at(token, identity, unix_now())
    }

    fn store_at(&self, token: &str, identity: &str, now: u64) -> Result<()> {
        let mut inner = self.write()?;

        while inner
            .by_identity
            .get(identity)
            .map_or(0, |tokens| tokens.len())
            >= self.max_tokens_per_identity
        {
            let oldest = inner.by_identity[identity]
                .iter()
                .min_by_key(|t| inner.records.get(*t).map_or(0, |r| r.created_at))
                .cloned();
            match oldest {
                Some(old) => {
                    if let Some(record) = inner.records.get_mut(&old) {
                        record.valid = false;
                    }
                    inner.drop_from_index(identity, &old);
                    tracing::debug!(
                        target: "justifier::registry",
                        identity = %identity,
                        "evicted oldest token at identity cap"
                    );
                }
                None => break,
            }
        }

        inner.records.insert(
            token.to_string(),
            TokenRecord {
                identity: identity.to_string(),
                created_at: now,
                last_used: now,
                valid: true,
            },
        );
        inner
            .by_identity
            .entry(identity.to_string())
            .or_default()
            .push(token.to_string());
        Ok(())
    }

    /// Look up a token and return its identity, refreshing `last_used`.
    ///
    /// Expiry is detected here: an out-of-TTL record is flagged invalid
    /// and dropped from the index before the error is returned.
    pub fn retrieve(&self, token: &str) -> Result<String> {
        self.retrieve_at(token, unix_now())
    }

    fn retrieve_at(&self, token: &str, now: u64) -> Result<String> {
        let mut inner = self.write()?;

        let record = match inner.records.get_mut(token) {
            Some(record) => record,
            None => return Err(ApiError::Auth(AuthErrorKind::NotFound)),
        };
        if !record.valid {
            return Err(ApiError::Auth(AuthErrorKind::Revoked));
        }
        if record.is_expired(now, self.ttl_secs) {
            record.valid = false;
            let identity = record.identity.clone();
            inner.drop_from_index(&identity, token);
            return Err(ApiError::Auth(AuthErrorKind::Expired));
        }

        record.last_used = now;
        Ok(record.identity.clone())
    }

    /// Revoke a token. Idempotent; returns whether state changed.
    pub fn revoke(&self, token: &str) -> Result<bool> {
        let mut inner = self.write()?;

        let identity = match inner.records.get_mut(token) {
            Some(record) if record.valid => {
                record.valid = false;
                record.identity.clone()
            }
            _ => return Ok(false),
        };
        inner.drop_from_index(&identity, token);
        Ok(true)
    }

    /// Revoke every live token for an identity; returns how many changed.
    pub fn revoke_all(&self, identity: &str) -> Result<usize> {
        let mut inner = self.write()?;

        let tokens = match inner.by_identity.remove(identity) {
            Some(tokens) => tokens,
            None => return Ok(0),
        };
        let mut revoked = 0;
        for token in &tokens {
            if let Some(record) = inner.records.get_mut(token) {
                if record.valid {
                    record.valid = false;
                    revoked += 1;
                }
            }
        }
        Ok(revoked)
    }

    /// Physically delete revoked and expired records; returns how many
    /// were removed.
    pub fn sweep(&self) -> Result<usize> {
        self.sweep_at(unix_now())
    }

    fn sweep_at(&self, now: u64) -> Result<usize> {
        let mut inner = self.write()?;
        let ttl = self.ttl_secs;

        let dead: Vec<(String, String)> = inner
            .records
            .iter()
            .filter(|(_, r)| !r.valid || r.is_expired(now, ttl))
            .map(|(token, r)| (token.clone(), r.identity.clone()))
            .collect();

        for (token, identity) in &dead {
            inner.records.remove(token);
            inner.drop_from_index(identity, token);
        }
        Ok(dead.len())
    }

    pub fn stats(&self) -> Result<RegistryStats> {
        self.stats_at(unix_now())
    }

    fn stats_at(&self, now: u64) -> Result<RegistryStats> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApiError::Internal("token registry lock poisoned".to_string()))?;
        let active_tokens = inner
            .records
            .values()
            .filter(|r| r.valid && !r.is_expired(now, self.ttl_secs))
            .count() as u64;
        Ok(RegistryStats {
            active_tokens,
            active_identities: inner.by_identity.len() as u64,
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, RegistryInner>> {
        self.inner
            .write()
            .map_err(|_| ApiError::Internal("token registry lock poisoned".to_string()))
    }

    #[cfg(test)]
    fn backdate(&self, token: &str, seconds: u64) {
        let mut inner = self.inner.write().unwrap();
        if let Some(record) = inner.records.get_mut(token) {
            record.created_at = record.created_at.saturating_sub(seconds);
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
