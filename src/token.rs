//! Opaque bearer token derivation.
//!
//! A token is 64 characters over `[A-Za-z0-9]`: a 32-character random
//! prefix drawn from the OS RNG, followed by the hex SHA-256 digest of
//! the identity, the issuer tag, and that prefix, truncated to length.
//! The random prefix carries the unpredictability; the digest binds the
//! token to the identity and this server's issuer tag.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Fixed token length in characters.
pub const TOKEN_LENGTH: usize = 64;

const RANDOM_PREFIX_LENGTH: usize = 32;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{64}$").expect("token pattern is valid"));

/// Derives opaque tokens bound to an identity and a server-side tag.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    issuer_tag: String,
}

impl TokenIssuer {
    pub fn new(issuer_tag: impl Into<String>) -> Self {
        Self {
            issuer_tag: issuer_tag.into(),
        }
    }

    /// Issue a fresh token for `identity`.
    pub fn issue(&self, identity: &str) -> String {
        let prefix: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(RANDOM_PREFIX_LENGTH)
            .map(char::from)
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update(self.issuer_tag.as_bytes());
        hasher.update(prefix.as_bytes());
        let digest = hex::encode(hasher.finalize());

        // Hex digits are already inside the token alphabet, so the
        // concatenation only needs truncating.
        let mut token = prefix;
        token.push_str(&digest);
        token.truncate(TOKEN_LENGTH);
        token
    }

    /// Check length and alphabet only; existence and validity are the
    /// registry's concern.
    pub fn validate_format(token: &str) -> bool {
        TOKEN_PATTERN.is_match(token)
    }
}
