//! Durable chain storage for the tourist safety ledger.
//!
//! The whole chain lives in one JSON document (`{"chain": [...]}`). Every
//! mutation rewrites the document: the new content goes to a temporary file
//! in the same directory, which then atomically replaces the store, so a
//! reader never observes a half-written ledger.
//!
//! # Storage Backends
//!
//! All backends implement the [`ChainStore`] trait:
//!
//! - [`FileChainStore`] -- the production single-file store
//! - [`InMemoryChainStore`] -- byte buffer for tests and embedding
//!
//! # Load Policy
//!
//! 1. Missing store: write and return a genesis-only chain.
//! 2. Empty, unparsable, or block-less store: reset to genesis (logged at
//!    `warn`; prior content is lost).
//! 3. Envelope intact but a block undecodable: fail with
//!    [`StoreError::MalformedBlock`]; the document is left as is.
//! 4. Genesis hash stale: repair that one field and persist.
//! 5. I/O errors other than "not found" are propagated, never healed.

pub mod config;
pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use config::{StoreConfig, SyncMode};
pub use document::{decode_chain, encode_chain, DecodeError};
pub use error::{StoreError, StoreResult};
pub use file::FileChainStore;
pub use memory::InMemoryChainStore;
pub use traits::ChainStore;
