//! Foundation types for the tourist safety ledger (TSL).
//!
//! This crate provides the block and payload types shared by every other
//! TSL crate. It knows nothing about hashing or storage; it only defines
//! what a block *is* and how it looks on the wire.
//!
//! # Key Types
//!
//! - [`Block`]: One immutable ledger record linked to its predecessor
//! - [`BlockData`]: Genesis marker or a structured [`EventPayload`]
//! - [`IssueEvent`] / [`ResolutionEvent`]: Alert raised / alert closed
//! - [`BlockType`]: The `type` tag written next to every non-genesis block
//! - [`AlertStatus`]: Mutable resolution state owned by the relational store

pub mod block;
pub mod error;
pub mod event;
pub mod status;

pub use block::{Block, BlockData, BlockRecord, BlockType, GENESIS_MARKER, GENESIS_PREV_HASH};
pub use error::TypeError;
pub use event::{EventPayload, IssueEvent, Report, ResolutionEvent};
pub use status::AlertStatus;
