//! Short-lived access tokens minted from caller-supplied auth tokens.
//!
//! Public API calls carry an access token instead of the raw auth token.
//! Minting is deterministic (the same auth token maps to the same access
//! token for the lifetime of the cache) so repeated logins don't pile up
//! distinct entries.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::clock::Clock;

/// One-way function mapping an auth token to an access token.
pub type Minter = Box<dyn Fn(&str) -> String + Send + Sync>;

/// A minted access token entry.
#[derive(Debug, Clone)]
pub struct AccessTokenEntry {
    pub auth_token: String,
    pub issued_at: DateTime<Utc>,
}

/// TTL cache mapping access tokens back to the auth tokens they stand in for.
///
/// Expired entries are swept on [`mint`](Self::mint) only; reads never
/// mutate. An entry past its TTL stops resolving immediately but stays in
/// the map until the next mint.
pub struct AccessTokenCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    minter: Minter,
    entries: HashMap<String, AccessTokenEntry>,
}

impl AccessTokenCache {
    /// Create a cache with the default salted-SHA-256 minter.
    ///
    /// The salt is drawn fresh at construction, so access tokens are stable
    /// within a process but not across restarts.
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self::with_minter(clock, ttl, salted_sha256_minter())
    }

    /// Create a cache with a custom minter.
    pub fn with_minter(clock: Arc<dyn Clock>, ttl: Duration, minter: Minter) -> Self {
        Self {
            clock,
            ttl,
            minter,
            entries: HashMap::new(),
        }
    }

    /// Mint an access token for `auth_token`.
    ///
    /// Sweeps expired entries, then upserts the mapping. Re-minting the same
    /// auth token overwrites the entry with a fresh `issued_at`.
    pub fn mint(&mut self, auth_token: &str) -> String {
        self.sweep();

        let access_token = (self.minter)(auth_token);
        self.entries.insert(
            access_token.clone(),
            AccessTokenEntry {
                auth_token: auth_token.to_string(),
                issued_at: self.clock.now(),
            },
        );
        access_token
    }

    /// Resolve an access token back to its auth token.
    ///
    /// Returns `None` once the TTL has elapsed; the entry itself is only
    /// removed by a later sweep.
    pub fn auth_token_for(&self, access_token: &str) -> Option<&str> {
        let entry = self.entries.get(access_token)?;
        if self.clock.now() - entry.issued_at > self.ttl {
            return None;
        }
        Some(entry.auth_token.as_str())
    }

    /// Current raw contents, unfiltered by expiry.
    pub fn auth_tokens(&self) -> Vec<String> {
        self.entries
            .values()
            .map(|entry| entry.auth_token.clone())
            .collect()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&mut self) {
        let now = self.clock.now();
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.issued_at <= ttl);

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Swept {} expired access tokens", removed);
        }
    }
}

impl std::fmt::Debug for AccessTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Default minter: SHA-256 over a per-cache random salt and the auth token,
/// base64url-encoded.
fn salted_sha256_minter() -> Minter {
    let mut salt = [0u8; 16];
    rand::rng().fill_bytes(&mut salt);

    Box::new(move |auth_token: &str| {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(auth_token.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    })
}
