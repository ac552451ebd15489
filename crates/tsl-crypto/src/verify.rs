use std::fmt;

use tsl_types::{Block, GENESIS_PREV_HASH};

use crate::hasher::BlockHasher;

/// Which chain invariant a block breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Stored hash differs from a recomputation over the block's fields.
    HashMismatch,
    /// Position 0 is not a well-formed genesis block.
    InvalidGenesis,
    /// `index` is not the predecessor's index plus one.
    IndexMismatch,
    /// `prev_hash` does not equal the predecessor's `hash`.
    LinkMismatch,
    /// The stored block could not be decoded at all.
    MalformedBlock,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch => write!(f, "hash mismatch"),
            Self::InvalidGenesis => write!(f, "invalid genesis"),
            Self::IndexMismatch => write!(f, "index mismatch"),
            Self::LinkMismatch => write!(f, "linkage mismatch"),
            Self::MalformedBlock => write!(f, "malformed block"),
        }
    }
}

/// A broken invariant at a specific chain position.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("block {position}: {kind} (expected {expected}, found {found})")]
pub struct ChainViolation {
    pub position: u64,
    pub kind: ViolationKind,
    pub expected: String,
    pub found: String,
}

/// Hash chain integrity verifier.
///
/// For each block, in chain order:
/// 1. the stored hash matches a recomputation
/// 2. position 0 is genesis (`index == 0`, genesis payload, `prev_hash == "0"`);
///    every later block has `index == prev.index + 1`
/// 3. every later block has `prev_hash == prev.hash`
///
/// The hash is checked first, so editing any single field of a block while
/// leaving its hash alone is always reported as a hash mismatch at that block.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, stopping at the first violation.
    pub fn verify(blocks: &[Block]) -> Result<(), ChainViolation> {
        for position in 0..blocks.len() {
            if let Some(violation) = Self::check_block(blocks, position).into_iter().next() {
                return Err(violation);
            }
        }
        Ok(())
    }

    /// Every violation in the chain, in position order.
    pub fn violations(blocks: &[Block]) -> Vec<ChainViolation> {
        (0..blocks.len())
            .flat_map(|position| Self::check_block(blocks, position))
            .collect()
    }

    /// All violations of the block at `position`, in check order.
    pub fn check_block(blocks: &[Block], position: usize) -> Vec<ChainViolation> {
        let Some(block) = blocks.get(position) else {
            return Vec::new();
        };
        let at = position as u64;
        let mut found = Vec::new();

        let computed = BlockHasher::BLOCK.hash_block(block);
        if computed != block.hash {
            found.push(violation(at, ViolationKind::HashMismatch, computed, &block.hash));
        }

        match position.checked_sub(1).and_then(|p| blocks.get(p)) {
            None => {
                if block.index != 0 {
                    found.push(violation(at, ViolationKind::InvalidGenesis, "index 0", &block.index));
                } else if !block.is_genesis() {
                    found.push(violation(
                        at,
                        ViolationKind::InvalidGenesis,
                        "genesis payload",
                        block.block_type().map(|t| t.to_string()).unwrap_or_default(),
                    ));
                } else if block.prev_hash != GENESIS_PREV_HASH {
                    found.push(violation(
                        at,
                        ViolationKind::InvalidGenesis,
                        GENESIS_PREV_HASH,
                        &block.prev_hash,
                    ));
                }
            }
            Some(prev) => {
                match prev.index.checked_add(1) {
                    Some(expected) if expected == block.index => {}
                    Some(expected) => {
                        found.push(violation(at, ViolationKind::IndexMismatch, expected, &block.index));
                    }
                    None => found.push(violation(
                        at,
                        ViolationKind::IndexMismatch,
                        "no successor to u64::MAX",
                        &block.index,
                    )),
                }
                if block.prev_hash != prev.hash {
                    found.push(violation(at, ViolationKind::LinkMismatch, &prev.hash, &block.prev_hash));
                }
            }
        }

        found
    }
}

fn violation(
    position: u64,
    kind: ViolationKind,
    expected: impl ToString,
    found: impl ToString,
) -> ChainViolation {
    ChainViolation {
        position,
        kind,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
