use std::sync::RwLock;

use tracing::{debug, info, warn};
use tsl_crypto::Chain;
use tsl_store::{ChainStore, StoreError};
use tsl_types::{Block, EventPayload};

use crate::error::LedgerError;
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::ValidationReport;

/// Ledger engine over one durable chain store.
///
/// Every operation is a blocking `load -> [mutate] -> persist` against the
/// store. Appends hold the write side of `gate` for the whole sequence, so
/// two appenders can never build on the same tip. Reads hold the read side
/// and may run together.
pub struct Ledger<S> {
    store: S,
    gate: RwLock<()>,
}

impl<S: ChainStore> Ledger<S> {
    /// Open a ledger, initializing or healing the store immediately.
    ///
    /// A document holding an undecodable block still opens; reads and
    /// appends then fail with [`LedgerError::InvalidChain`].
    pub fn open(store: S) -> Result<Self, LedgerError> {
        let ledger = Self {
            store,
            gate: RwLock::new(()),
        };
        let loaded = {
            let _guard = ledger.gate.write().map_err(|_| LedgerError::LockPoisoned)?;
            ledger.store.load()
        };
        match loaded {
            Ok(chain) => info!(
                store = %ledger.store.location(),
                blocks = chain.len(),
                tip = %chain.tip().short_hash(),
                "ledger opened"
            ),
            // Kept open so validation can report the bad block; every
            // operation fails with InvalidChain until the document is fixed.
            Err(StoreError::MalformedBlock { position, reason }) => warn!(
                store = %ledger.store.location(),
                position,
                %reason,
                "ledger opened over an undecodable block"
            ),
            Err(err) => return Err(err.into()),
        }
        Ok(ledger)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every violation in the chain, for audit tooling.
    pub fn validation_report(&self) -> Result<ValidationReport, LedgerError> {
        Ok(ValidationReport::build(&self.chain()?))
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.chain()?.len())
    }
}

impl<S: ChainStore> LedgerWriter for Ledger<S> {
    fn append(&self, payload: EventPayload) -> Result<Block, LedgerError> {
        let _guard = self.gate.write().map_err(|_| LedgerError::LockPoisoned)?;

        let mut chain = self.store.load()?;
        let block = chain.append_candidate(payload)?;
        chain.push(block.clone());
        self.store.persist(&chain)?;

        debug!(
            index = block.index,
            kind = ?block.block_type(),
            hash = %block.short_hash(),
            "block appended"
        );
        Ok(block)
    }
}

impl<S: ChainStore> LedgerReader for Ledger<S> {
    fn chain(&self) -> Result<Chain, LedgerError> {
        let _guard = self.gate.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(self.store.load()?)
    }
}

impl<S> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}
