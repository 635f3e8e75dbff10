//! Flat-file session token store.
//!
//! The whole table is held in memory and mirrored to disk as a UTF-8 JSON
//! object (`lookupKey -> {signedPayload, perTokenKey}`) on every mutation.
//! Single-process writers only: interleaved read-modify-write from multiple
//! processes can lose updates, which is a stated limitation of this backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sonabridge_tokens::SessionToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::SessionTokenStore;

/// JSON-file-backed store.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: HashMap<String, SessionToken>,
}

impl FileTokenStore {
    /// Open the store at `path`, creating the parent directory and seeding
    /// an empty table if the file is absent.
    ///
    /// A missing parent directory that cannot be created is fatal; an
    /// unreadable or unparseable file is logged and treated as start-empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut store = Self {
            entries: HashMap::new(),
            path,
        };

        if store.path.exists() {
            store.entries = load_entries(&store.path);
        } else {
            store.persist();
        }

        info!("Token file store opened at {:?}", store.path);
        Ok(store)
    }

    /// The on-disk location of the table.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!("Failed to write token file {:?}: {}", self.path, e);
                }
            }
            Err(e) => warn!("Failed to serialize token table: {}", e),
        }
    }
}

fn load_entries(path: &Path) -> HashMap<String, SessionToken> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read token file {:?}, starting empty: {}", path, e);
            return HashMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Failed to parse token file {:?}, starting empty: {}",
                path, e
            );
            HashMap::new()
        }
    }
}

impl SessionTokenStore for FileTokenStore {
    fn get(&self, lookup_key: &str) -> Option<SessionToken> {
        self.entries.get(lookup_key).cloned()
    }

    fn set(&mut self, lookup_key: &str, token: SessionToken) {
        self.entries.insert(lookup_key.to_string(), token);
        self.persist();
    }

    fn delete(&mut self, lookup_key: &str) {
        if self.entries.remove(lookup_key).is_some() {
            self.persist();
        }
    }

    fn get_all(&self) -> HashMap<String, SessionToken> {
        self.entries.clone()
    }
}
