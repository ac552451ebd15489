use serde_json::{Map, Value};
use tsl_types::{Block, BlockRecord};

/// Domain-separated BLAKE3 hasher over canonical JSON.
///
/// The domain tag is prepended to every hash computation, so a block digest
/// can never collide with a digest of the same bytes computed for another
/// purpose.
pub struct BlockHasher {
    domain: &'static str,
}

impl BlockHasher {
    /// Hasher for ledger blocks.
    pub const BLOCK: Self = Self {
        domain: "tsl-block-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation. Returns lowercase hex.
    pub fn hash(&self, data: &[u8]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        hex::encode(hasher.finalize().as_bytes())
    }

    /// Hash a JSON value in canonical form.
    pub fn hash_value(&self, value: &Value) -> String {
        self.hash(&canonical_bytes(value))
    }

    /// Digest of a block over every field except `hash`.
    ///
    /// The stored `hash` is ignored, so this is also the recomputation used
    /// when verifying a block loaded from disk.
    pub fn hash_block(&self, block: &Block) -> String {
        let record = BlockRecord::from(block.clone());
        // BlockRecord has only string keys and finite-or-null numbers;
        // conversion to a value cannot fail.
        let mut value = serde_json::to_value(record).unwrap_or_default();
        if let Value::Object(map) = &mut value {
            map.remove("hash");
        }
        self.hash_value(&value)
    }

    /// Returns `true` if the block's stored hash matches a recomputation.
    pub fn verify_block(&self, block: &Block) -> bool {
        self.hash_block(block) == block.hash
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Compact JSON with object keys sorted at every depth.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(&canonicalize(value)).unwrap_or_default()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn hash_is_deterministic() {
        let h1 = BlockHasher::BLOCK.hash(b"hello world");
        let h2 = BlockHasher::BLOCK.hash(b"hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let custom = BlockHasher::new("tsl-other-v1");
        assert_ne!(BlockHasher::BLOCK.hash(b"same"), custom.hash(b"same"));
        assert_eq!(custom.domain(), "tsl-other-v1");
    }

    #[test]
    fn canonical_form_is_compact_and_sorted() {
        let value = json!({"b": 1, "a": {"z": true, "y": [ {"d": 1, "c": 2} ]}});
        let bytes = canonical_bytes(&value);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":{"y":[{"c":2,"d":1}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn hash_block_ignores_stored_hash() {
        let raw = json!({
            "index": 0,
            "timestamp": "1970-01-01T00:00:00Z",
            "data": "genesis",
            "prev_hash": "0",
            "hash": "first"
        });
        let mut block: Block = serde_json::from_value(raw).unwrap();
        let before = BlockHasher::BLOCK.hash_block(&block);
        block.hash = "second".into();
        assert_eq!(before, BlockHasher::BLOCK.hash_block(&block));
        assert!(!BlockHasher::BLOCK.verify_block(&block));

        block.hash = before;
        assert!(BlockHasher::BLOCK.verify_block(&block));
    }

    proptest! {
        #[test]
        fn digest_independent_of_insertion_order(
            entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..12)
        ) {
            let forward: Map<String, Value> =
                entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let reverse: Map<String, Value> =
                entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
            prop_assert_eq!(
                BlockHasher::BLOCK.hash_value(&Value::Object(forward)),
                BlockHasher::BLOCK.hash_value(&Value::Object(reverse))
            );
        }
    }
}
