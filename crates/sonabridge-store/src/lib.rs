//! Pluggable persistence for outstanding session tokens.
//!
//! Maps an external lookup key (the outer protocol's token identifier) to a
//! [`SessionToken`](sonabridge_tokens::SessionToken) across three
//! interchangeable backends:
//!
//! - [`MemoryTokenStore`] — in-process map, no durability
//! - [`FileTokenStore`] — JSON file, whole table rewritten on each mutation
//! - [`SqliteTokenStore`] — embedded SQLite, plus a one-time JSON migration
//!
//! All backends implement [`SessionTokenStore`]; select one at configuration
//! time with [`open_store`]. Storage degradation after a successful open is
//! logged and hidden behind safe defaults so a failing disk never crashes the
//! token issuing or verifying path.

mod config;
mod error;
mod file;
mod memory;
mod sqlite;
mod store;

pub use config::{StoreConfig, open_store};
pub use error::{Result, StoreError};
pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;
pub use sqlite::SqliteTokenStore;
pub use store::SessionTokenStore;
