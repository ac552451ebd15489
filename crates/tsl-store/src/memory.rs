use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::ChainStore;

/// In-memory ledger document.
///
/// Intended for tests and embedding. The document is held as raw bytes so
/// that corrupt or legacy content can be injected exactly as it would sit
/// on disk.
pub struct InMemoryChainStore {
    document: RwLock<Option<Vec<u8>>>,
    writes: AtomicUsize,
    read_only: AtomicBool,
}

impl InMemoryChainStore {
    /// Create a store with no document.
    pub fn new() -> Self {
        Self {
            document: RwLock::new(None),
            writes: AtomicUsize::new(0),
            read_only: AtomicBool::new(false),
        }
    }

    /// Create a store holding the given raw document.
    pub fn with_document(bytes: Vec<u8>) -> Self {
        let store = Self::new();
        if let Ok(mut document) = store.document.write() {
            *document = Some(bytes);
        }
        store
    }

    /// Current raw document.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.document.read().ok().and_then(|d| d.clone())
    }

    /// Number of successful `write_document` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl Default for InMemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainStore for InMemoryChainStore {
    fn read_document(&self) -> StoreResult<Option<Vec<u8>>> {
        let document = self.document.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(document.clone())
    }

    fn write_document(&self, bytes: &[u8]) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let mut document = self.document.write().map_err(|_| StoreError::LockPoisoned)?;
        *document = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}

impl std::fmt::Debug for InMemoryChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChainStore")
            .field("document_len", &self.document().map(|d| d.len()))
            .field("writes", &self.write_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsl_crypto::Chain;

    #[test]
    fn starts_without_document() {
        let store = InMemoryChainStore::new();
        assert!(store.read_document().unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn read_only_rejects_writes() {
        let store = InMemoryChainStore::new();
        store.set_read_only(true);
        assert!(matches!(store.persist(&Chain::new()), Err(StoreError::ReadOnly)));
        assert!(store.document().is_none());

        store.set_read_only(false);
        store.persist(&Chain::new()).unwrap();
        assert_eq!(store.write_count(), 1);
    }
}
