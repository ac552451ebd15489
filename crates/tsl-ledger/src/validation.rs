use tsl_crypto::{Chain, ChainViolation, HashChainVerifier};
use tsl_types::BlockType;

/// Result of a full chain audit.
///
/// Unlike [`crate::LedgerReader::validate`], which stops at the first broken
/// invariant, the report walks the whole chain and lists every violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub block_count: u64,
    pub issue_count: u64,
    pub resolution_count: u64,
    pub violations: Vec<ChainViolation>,
}

impl ValidationReport {
    pub fn build(chain: &Chain) -> Self {
        let count = |kind: BlockType| {
            chain
                .iter()
                .filter(|block| block.block_type() == Some(kind))
                .count() as u64
        };

        Self {
            block_count: chain.len() as u64,
            issue_count: count(BlockType::Issue),
            resolution_count: count(BlockType::Resolution),
            violations: HashChainVerifier::violations(chain.blocks()),
        }
    }

    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn first_violation(&self) -> Option<&ChainViolation> {
        self.violations.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsl_crypto::ViolationKind;
    use tsl_types::{EventPayload, IssueEvent, ResolutionEvent};

    fn chain() -> Chain {
        let mut chain = Chain::new();
        for payload in [
            EventPayload::from(IssueEvent::new("a1", "t1", 1.0, 1.0)),
            EventPayload::from(IssueEvent::new("a2", "t2", 2.0, 2.0)),
            EventPayload::from(ResolutionEvent::new("a1")),
        ] {
            let block = chain.append_candidate(payload).unwrap();
            chain.push(block);
        }
        chain
    }

    #[test]
    fn valid_chain_report() {
        let report = ValidationReport::build(&chain());
        assert!(report.is_valid());
        assert_eq!(report.block_count, 4);
        assert_eq!(report.issue_count, 2);
        assert_eq!(report.resolution_count, 1);
        assert!(report.first_violation().is_none());
    }

    #[test]
    fn report_lists_every_violation() {
        let mut blocks = chain().into_blocks();
        blocks[1].hash = "x".repeat(64);
        blocks[3].prev_hash = "y".repeat(64);
        let report = ValidationReport::build(&Chain::from_blocks(blocks).unwrap());

        assert!(!report.is_valid());
        let positions: Vec<u64> = report.violations.iter().map(|v| v.position).collect();
        // 1: own hash, 2: link to altered hash, 3: tampered prev_hash changes its hash
        assert_eq!(positions, vec![1, 2, 3, 3]);
        assert_eq!(
            report.first_violation().map(|v| v.kind),
            Some(ViolationKind::HashMismatch)
        );
    }
}
