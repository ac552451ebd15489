use serde::Deserialize;
use serde_json::Value;
use tsl_crypto::Chain;
use tsl_types::Block;

use crate::error::{StoreError, StoreResult};

/// Why a stored document could not be turned into a chain.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("document is empty")]
    Empty,

    /// Invalid JSON, or a missing or empty `chain` collection.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The document is intact but one of its blocks does not decode.
    #[error("block {position} does not decode: {reason}")]
    Block { position: u64, reason: String },
}

/// Parse a ledger document.
///
/// The envelope is checked before any block: only an empty document, invalid
/// JSON, or a missing or empty `chain` array count as unreadable. A block
/// that fails to decode is reported with its position instead.
pub fn decode_chain(bytes: &[u8]) -> Result<Chain, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }
    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let raw_blocks = match document.get("chain") {
        Some(Value::Array(raw)) if !raw.is_empty() => raw,
        Some(Value::Array(_)) => return Err(DecodeError::Malformed("`chain` has no blocks".into())),
        Some(_) => return Err(DecodeError::Malformed("`chain` is not an array".into())),
        None => return Err(DecodeError::Malformed("missing `chain` collection".into())),
    };

    let blocks = raw_blocks
        .iter()
        .enumerate()
        .map(|(position, raw)| {
            Block::deserialize(raw).map_err(|e| DecodeError::Block {
                position: position as u64,
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Chain::from_blocks(blocks).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Serialize a chain as a pretty-printed ledger document.
pub fn encode_chain(chain: &Chain) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(chain).map_err(|e| StoreError::Serialization(e.to_string()))
}
