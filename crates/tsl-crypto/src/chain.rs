use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsl_types::{Block, BlockData, EventPayload, GENESIS_PREV_HASH};

use crate::hasher::BlockHasher;
use crate::verify::{ChainViolation, HashChainVerifier};

/// Ordered, append-only sequence of blocks rooted at genesis.
///
/// A `Chain` is never empty. It serializes as the ledger document
/// `{"chain": [...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChainDocument")]
pub struct Chain {
    #[serde(rename = "chain")]
    blocks: Vec<Block>,
}

#[derive(Deserialize)]
struct ChainDocument {
    chain: Vec<Block>,
}

impl TryFrom<ChainDocument> for Chain {
    type Error = ChainError;

    fn try_from(document: ChainDocument) -> Result<Self, Self::Error> {
        Self::from_blocks(document.chain)
    }
}

impl Chain {
    /// A chain holding only a freshly built genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Self::genesis_block()],
        }
    }

    /// Wrap existing blocks. The blocks are not validated, only required to
    /// be non-empty; use [`Chain::validate`] for integrity.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, ChainError> {
        if blocks.is_empty() {
            return Err(ChainError::Empty);
        }
        Ok(Self { blocks })
    }

    /// The canonical genesis block.
    ///
    /// Every field is fixed, so every ledger shares the same genesis hash.
    pub fn genesis_block() -> Block {
        let mut block = Block {
            index: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            data: BlockData::Genesis,
            prev_hash: GENESIS_PREV_HASH.into(),
            hash: String::new(),
        };
        block.hash = BlockHasher::BLOCK.hash_block(&block);
        block
    }

    /// Build the block that would follow the current tip, stamped now.
    ///
    /// The chain itself is not modified.
    pub fn append_candidate(&self, payload: EventPayload) -> Result<Block, ChainError> {
        self.append_candidate_at(payload, Utc::now())
    }

    /// Build the next block with an explicit timestamp.
    ///
    /// Fails when the tip already carries the largest representable index.
    pub fn append_candidate_at(
        &self,
        payload: EventPayload,
        timestamp: DateTime<Utc>,
    ) -> Result<Block, ChainError> {
        let tip = self.tip();
        let index = tip.index.checked_add(1).ok_or(ChainError::IndexOverflow {
            position: (self.blocks.len() - 1) as u64,
        })?;
        let mut block = Block {
            index,
            timestamp,
            data: BlockData::Event(payload),
            prev_hash: tip.hash.clone(),
            hash: String::new(),
        };
        block.hash = BlockHasher::BLOCK.hash_block(&block);
        Ok(block)
    }

    /// Append a block built by [`Chain::append_candidate`].
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Recompute the genesis hash and overwrite it if it is stale.
    ///
    /// This is the only field write allowed after a block is sealed.
    /// Returns `true` if the hash was repaired.
    pub fn repair_genesis_hash(&mut self) -> bool {
        let genesis = &mut self.blocks[0];
        let computed = BlockHasher::BLOCK.hash_block(genesis);
        if computed == genesis.hash {
            return false;
        }
        genesis.hash = computed;
        true
    }

    /// Check every chain invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), ChainViolation> {
        HashChainVerifier::verify(&self.blocks)
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// The latest block.
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Block at chain position `index`.
    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Errors from chain construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain has no blocks (genesis required)")]
    Empty,

    /// The tip's index is `u64::MAX`, so no block can follow it.
    #[error("block {position} carries the maximum index; nothing can follow it")]
    IndexOverflow { position: u64 },
}
