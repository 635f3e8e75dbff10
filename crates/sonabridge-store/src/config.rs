//! Configuration-time backend selection.

use std::path::PathBuf;

use crate::error::Result;
use crate::file::FileTokenStore;
use crate::memory::MemoryTokenStore;
use crate::sqlite::SqliteTokenStore;
use crate::store::SessionTokenStore;

/// Which persistence backend to use for session tokens.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// In-process map; lost on restart.
    Memory,
    /// JSON file at the given path.
    File { path: PathBuf },
    /// Embedded SQLite database at the given path.
    Sqlite { path: PathBuf },
}

/// Open the configured backend.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn SessionTokenStore>> {
    match config {
        StoreConfig::Memory => Ok(Box::new(MemoryTokenStore::new())),
        StoreConfig::File { path } => Ok(Box::new(FileTokenStore::open(path)?)),
        StoreConfig::Sqlite { path } => Ok(Box::new(SqliteTokenStore::open(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonabridge_tokens::SessionToken;

    fn token() -> SessionToken {
        SessionToken {
            signed_payload: "payload".to_string(),
            per_token_key: "key".to_string(),
        }
    }

    #[test]
    fn each_variant_yields_a_working_store() {
        let tmp = tempfile::tempdir().unwrap();
        let configs = [
            StoreConfig::Memory,
            StoreConfig::File {
                path: tmp.path().join("tokens.json"),
            },
            StoreConfig::Sqlite {
                path: tmp.path().join("tokens.db"),
            },
        ];

        for config in &configs {
            let mut store = open_store(config).unwrap();
            store.set("sonos-1", token());
            assert_eq!(store.get("sonos-1"), Some(token()), "{config:?}");
        }
    }
}
