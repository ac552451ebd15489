use std::sync::Arc;

use tracing::{debug, warn};
use tsl_crypto::Chain;

use crate::document::{decode_chain, encode_chain, DecodeError};
use crate::error::{StoreError, StoreResult};

/// Durable home of one ledger document.
///
/// Implementations supply raw document I/O; `load` and `persist` build the
/// load-or-initialize and whole-document rewrite policy on top of it.
///
/// All implementations must satisfy these invariants:
/// - `write_document` replaces the previous document atomically. A
///   concurrent `read_document` sees either the old or the new bytes.
/// - `read_document` returns `Ok(None)` only when no document exists.
/// - All I/O errors are propagated, never silently ignored.
pub trait ChainStore: Send + Sync {
    /// Raw document bytes, or `None` if the store does not exist yet.
    fn read_document(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Atomically replace the whole document.
    fn write_document(&self, bytes: &[u8]) -> StoreResult<()>;

    /// Human-readable store location for logs.
    fn location(&self) -> String;

    /// Load the chain, initializing or healing the store when needed.
    ///
    /// A missing, empty, or unparsable document is replaced by a
    /// genesis-only chain. A document whose envelope parses but holds an
    /// undecodable block fails with [`StoreError::MalformedBlock`] and is not
    /// rewritten. A stale genesis hash is repaired in place; later blocks are
    /// never touched.
    fn load(&self) -> StoreResult<Chain> {
        let Some(bytes) = self.read_document()? else {
            debug!(store = %self.location(), "no ledger document; initializing genesis");
            let chain = Chain::new();
            self.persist(&chain)?;
            return Ok(chain);
        };

        let mut chain = match decode_chain(&bytes) {
            Ok(chain) => chain,
            Err(DecodeError::Block { position, reason }) => {
                warn!(
                    store = %self.location(),
                    position,
                    %reason,
                    "ledger block undecodable; leaving document untouched"
                );
                return Err(StoreError::MalformedBlock { position, reason });
            }
            Err(reason) => {
                warn!(
                    store = %self.location(),
                    %reason,
                    discarded_bytes = bytes.len(),
                    "ledger document unreadable; resetting to genesis"
                );
                let chain = Chain::new();
                self.persist(&chain)?;
                return Ok(chain);
            }
        };

        if chain.repair_genesis_hash() {
            warn!(store = %self.location(), "genesis hash mismatch; repaired in place");
            self.persist(&chain)?;
        }

        debug!(store = %self.location(), blocks = chain.len(), "ledger loaded");
        Ok(chain)
    }

    /// Serialize the full chain and overwrite the store.
    fn persist(&self, chain: &Chain) -> StoreResult<()> {
        let bytes = encode_chain(chain)?;
        self.write_document(&bytes)?;
        debug!(store = %self.location(), blocks = chain.len(), bytes = bytes.len(), "ledger persisted");
        Ok(())
    }
}

impl<S: ChainStore + ?Sized> ChainStore for Box<S> {
    fn read_document(&self) -> StoreResult<Option<Vec<u8>>> {
        (**self).read_document()
    }

    fn write_document(&self, bytes: &[u8]) -> StoreResult<()> {
        (**self).write_document(bytes)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

impl<S: ChainStore + ?Sized> ChainStore for Arc<S> {
    fn read_document(&self) -> StoreResult<Option<Vec<u8>>> {
        (**self).read_document()
    }

    fn write_document(&self, bytes: &[u8]) -> StoreResult<()> {
        (**self).write_document(bytes)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
