//! Hashing and the hash-chain model for the tourist safety ledger.
//!
//! Provides the domain-separated BLAKE3 [`BlockHasher`] over a canonical
//! JSON form, the in-memory [`Chain`] with its construction rules, and the
//! [`HashChainVerifier`] that checks index, link, and hash invariants.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod chain;
pub mod hasher;
pub mod verify;

pub use chain::{Chain, ChainError};
pub use hasher::{canonical_bytes, BlockHasher};
pub use verify::{ChainViolation, HashChainVerifier, ViolationKind};
