use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::{StoreConfig, SyncMode};
use crate::error::StoreResult;
use crate::traits::ChainStore;

/// Single-file ledger store.
///
/// Writes go to a temporary file next to the target, are optionally synced,
/// and then renamed over the target. Readers of the path therefore see
/// either the previous document or the new one, never a torn write.
#[derive(Debug)]
pub struct FileChainStore {
    path: PathBuf,
    sync_mode: SyncMode,
}

impl FileChainStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            path: config.path,
            sync_mode: config.sync_mode,
        }
    }

    /// Store at `path` with default durability.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::at(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl ChainStore for FileChainStore {
    fn read_document(&self) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, bytes: &[u8]) -> StoreResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        if matches!(self.sync_mode, SyncMode::EveryWrite) {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), len = bytes.len(), "ledger document replaced");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
