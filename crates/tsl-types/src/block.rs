use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::event::{EventPayload, IssueEvent, ResolutionEvent};

/// Payload literal stored in the genesis block's `data` field.
pub const GENESIS_MARKER: &str = "genesis";

/// `prev_hash` of the genesis block.
pub const GENESIS_PREV_HASH: &str = "0";

/// Category tag of a non-genesis block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// A newly raised alert.
    Issue,
    /// The closure of a prior alert.
    Resolution,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue => write!(f, "issue"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Contents of a block's `data` field.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockData {
    Genesis,
    Event(EventPayload),
}

impl BlockData {
    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis)
    }

    pub fn payload(&self) -> Option<&EventPayload> {
        match self {
            Self::Genesis => None,
            Self::Event(payload) => Some(payload),
        }
    }

    pub fn block_type(&self) -> Option<BlockType> {
        self.payload().map(EventPayload::block_type)
    }
}

/// One immutable ledger record.
///
/// `hash` is computed once, when the block is sealed, over every other
/// field. Nothing in this crate recomputes it; see `tsl-crypto`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
    pub data: BlockData,
    /// Hex digest of the preceding block, `"0"` for genesis.
    pub prev_hash: String,
    /// Hex digest of this block's canonical fields.
    pub hash: String,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.data.is_genesis()
    }

    pub fn block_type(&self) -> Option<BlockType> {
        self.data.block_type()
    }

    pub fn payload(&self) -> Option<&EventPayload> {
        self.data.payload()
    }

    /// Alert id carried by the payload, if any.
    pub fn alert_uuid(&self) -> Option<&str> {
        self.payload().map(EventPayload::alert_uuid)
    }

    /// First 8 hex characters of the block hash.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block_type() {
            Some(kind) => write!(f, "#{} {} [{}]", self.index, kind, self.short_hash()),
            None => write!(f, "#{} genesis [{}]", self.index, self.short_hash()),
        }
    }
}

/// Wire representation of a block, exactly as it appears in the ledger file.
///
/// `data` stays an open JSON value here; [`Block`] decodes it into a typed
/// payload according to the `type` tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<BlockType>,
    pub prev_hash: String,
    pub hash: String,
}

impl TryFrom<BlockRecord> for Block {
    type Error = TypeError;

    fn try_from(record: BlockRecord) -> Result<Self, Self::Error> {
        let index = record.index;
        let malformed = |reason: String| TypeError::MalformedBlock { index, reason };

        let data = match (record.data, record.block_type) {
            (Value::String(marker), None) if marker == GENESIS_MARKER => BlockData::Genesis,
            (Value::String(marker), _) => {
                return Err(malformed(format!("unexpected marker payload {marker:?}")))
            }
            (value @ Value::Object(_), Some(BlockType::Issue)) => {
                let event: IssueEvent =
                    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
                BlockData::Event(EventPayload::Issue(event))
            }
            (value @ Value::Object(_), Some(BlockType::Resolution)) => {
                let event: ResolutionEvent =
                    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
                BlockData::Event(EventPayload::Resolution(event))
            }
            (Value::Object(_), None) => {
                return Err(malformed("event payload without a type tag".into()))
            }
            (other, _) => return Err(malformed(format!("unsupported payload {other}"))),
        };

        Ok(Self {
            index,
            timestamp: record.timestamp,
            data,
            prev_hash: record.prev_hash,
            hash: record.hash,
        })
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let block_type = block.block_type();
        // Event payloads are structs with string keys whose non-finite floats
        // map to null; conversion to a value cannot fail.
        let data = match block.data {
            BlockData::Genesis => Value::String(GENESIS_MARKER.into()),
            BlockData::Event(EventPayload::Issue(event)) => {
                serde_json::to_value(event).unwrap_or_default()
            }
            BlockData::Event(EventPayload::Resolution(event)) => {
                serde_json::to_value(event).unwrap_or_default()
            }
        };
        Self {
            index: block.index,
            timestamp: block.timestamp,
            data,
            block_type,
            prev_hash: block.prev_hash,
            hash: block.hash,
        }
    }
}
