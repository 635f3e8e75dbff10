//! In-memory session token store.

use std::collections::HashMap;

use sonabridge_tokens::SessionToken;

use crate::store::SessionTokenStore;

/// Plain in-process map. No durability; used for tests and non-persistent
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, SessionToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionTokenStore for MemoryTokenStore {
    fn get(&self, lookup_key: &str) -> Option<SessionToken> {
        self.entries.get(lookup_key).cloned()
    }

    fn set(&mut self, lookup_key: &str, token: SessionToken) {
        self.entries.insert(lookup_key.to_string(), token);
    }

    fn delete(&mut self, lookup_key: &str) {
        self.entries.remove(lookup_key);
    }

    fn get_all(&self) -> HashMap<String, SessionToken> {
        self.entries.clone()
    }
}
