use tsl_crypto::Chain;
use tsl_types::{Block, EventPayload};

use crate::error::LedgerError;

/// Write boundary for ledger append operations.
pub trait LedgerWriter: Send + Sync {
    /// Seal `payload` into the next block and persist it. The block's `type`
    /// tag follows the payload variant.
    fn append(&self, payload: EventPayload) -> Result<Block, LedgerError>;
}

/// Read boundary for ledger query and validation operations.
pub trait LedgerReader: Send + Sync {
    /// The full chain, genesis first.
    fn chain(&self) -> Result<Chain, LedgerError>;

    /// Block at chain position `index`.
    fn block_at(&self, index: u64) -> Result<Block, LedgerError> {
        let chain = self.chain()?;
        chain.get(index).cloned().ok_or(LedgerError::NotFound {
            index,
            len: chain.len(),
        })
    }

    /// Payload of the latest block carrying `alert_uuid`.
    fn find_by_alert_id(&self, alert_uuid: &str) -> Result<Option<EventPayload>, LedgerError> {
        let chain = self.chain()?;
        Ok(chain
            .iter()
            .rev()
            .filter_map(Block::payload)
            .find(|payload| payload.alert_uuid() == alert_uuid)
            .cloned())
    }

    /// Check every chain invariant, surfacing the first violation.
    fn validate(&self) -> Result<(), LedgerError> {
        self.chain()?.validate().map_err(LedgerError::from)
    }
}
