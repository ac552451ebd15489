use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Flush strategy applied before the temporary file replaces the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` the new document before renaming it into place.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (faster, not crash-durable).
    OsDefault,
}

/// Location and durability settings of the ledger store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the ledger document.
    pub path: PathBuf,
    pub sync_mode: SyncMode,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/blockchain.json"),
            sync_mode: SyncMode::default(),
        }
    }
}
