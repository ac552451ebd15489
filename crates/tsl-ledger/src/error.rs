use tsl_crypto::{ChainError, ChainViolation, ViolationKind};
use tsl_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("block {index} not found (chain length {len})")]
    NotFound { index: u64, len: usize },

    #[error("invalid chain at block {position}: {reason}")]
    InvalidChain {
        position: u64,
        kind: ViolationKind,
        reason: String,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("alert status store error: {0}")]
    StatusStore(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// `true` for errors caused by the request rather than the ledger.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::InvalidChain { .. } | Self::InvalidPayload(_)
        )
    }
}

impl From<ChainViolation> for LedgerError {
    fn from(violation: ChainViolation) -> Self {
        Self::InvalidChain {
            position: violation.position,
            kind: violation.kind,
            reason: violation.to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MalformedBlock { position, reason } => Self::InvalidChain {
                position,
                kind: ViolationKind::MalformedBlock,
                reason: format!("block {position} is malformed: {reason}"),
            },
            other => Self::Store(other),
        }
    }
}

impl From<ChainError> for LedgerError {
    fn from(err: ChainError) -> Self {
        let reason = err.to_string();
        match err {
            ChainError::IndexOverflow { position } => Self::InvalidChain {
                position,
                kind: ViolationKind::IndexMismatch,
                reason,
            },
            ChainError::Empty => Self::InvalidChain {
                position: 0,
                kind: ViolationKind::InvalidGenesis,
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_block_maps_to_invalid_chain() {
        let err = LedgerError::from(StoreError::MalformedBlock {
            position: 3,
            reason: "invalid type".into(),
        });
        match err {
            LedgerError::InvalidChain { position, kind, .. } => {
                assert_eq!(position, 3);
                assert_eq!(kind, ViolationKind::MalformedBlock);
            }
            other => panic!("expected InvalidChain, got {other:?}"),
        }
        assert!(matches!(
            LedgerError::from(StoreError::ReadOnly),
            LedgerError::Store(StoreError::ReadOnly)
        ));
    }

    #[test]
    fn index_overflow_is_a_client_error() {
        let err = LedgerError::from(ChainError::IndexOverflow { position: 4 });
        assert!(matches!(
            err,
            LedgerError::InvalidChain { position: 4, kind: ViolationKind::IndexMismatch, .. }
        ));
        assert!(err.is_client_error());
    }
}
