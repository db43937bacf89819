use std::fmt;

use tracing::{info, warn};

use super::block::Block;
use super::chain::Blockchain;

/// A single defect found by the integrity scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFault {
    HashMismatch {
        height: u64,
        stored: String,
        recomputed: String,
    },
    BrokenLink {
        height: u64,
        expected: String,
        found: Option<String>,
    },
}

impl fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IntegrityFault::HashMismatch {
                height,
                stored,
                recomputed,
            } => write!(
                f,
                "Block #{} failed self-validation: stored hash {} does not match recomputed hash {}",
                height, stored, recomputed
            ),
            IntegrityFault::BrokenLink {
                height,
                expected,
                found,
            } => write!(
                f,
                "Block #{} is not linked to its predecessor: previousBlockHash is {}, expected {}",
                height,
                found.as_deref().unwrap_or("<none>"),
                expected
            ),
        }
    }
}

/// Front-to-back scan of self-hashes and linkage. Never stops early.
pub fn scan_chain(blocks: &[Block]) -> Vec<IntegrityFault> {
    let mut faults = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        if !block.validate() {
            faults.push(IntegrityFault::HashMismatch {
                height: block.height,
                stored: block.hash.clone(),
                recomputed: block.compute_hash(),
            });
        }

        if i > 0 {
            let previous = &blocks[i - 1];
            if block.previous_block_hash.as_deref() != Some(previous.hash.as_str()) {
                faults.push(IntegrityFault::BrokenLink {
                    height: block.height,
                    expected: previous.hash.clone(),
                    found: block.previous_block_hash.clone(),
                });
            }
        }
    }

    faults
}

impl Blockchain {
    /// Every integrity defect in chain order; empty means the chain is valid.
    pub fn integrity_faults(&self) -> Vec<IntegrityFault> {
        scan_chain(&self.chain.read())
    }

    pub fn validate_chain(&self) -> Vec<String> {
        let _enter = self.span.enter();
        let errors: Vec<String> = self
            .integrity_faults()
            .iter()
            .map(ToString::to_string)
            .collect();

        if errors.is_empty() {
            info!(blocks = self.len(), "chain validated");
        } else {
            for e in &errors {
                warn!(fault = %e, "chain validation");
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::core::block::BlockPayload;
    use crate::blockchain::core::chain::tests::{star_block, test_chain};
    use serde_json::json;

    fn chain_with_stars(n: usize) -> Blockchain {
        let (chain, clock) = test_chain();
        for i in 0..n {
            clock.advance(1);
            chain
                .append_block(star_block("owner", json!({ "n": i })))
                .unwrap();
        }
        chain
    }

    #[test]
    fn test_valid_chain_has_no_errors() {
        let chain = chain_with_stars(5);
        assert!(chain.validate_chain().is_empty());
    }

    #[test]
    fn test_tampered_payload_is_detected() {
        let chain = chain_with_stars(3);
        let forged = star_block("owner", json!({ "n": "forged" }));
        chain.chain.write()[2].body = forged.body;

        let errors = chain.validate_chain();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Block #2 failed self-validation"));
    }

    #[test]
    fn test_resealed_tamper_breaks_next_link() {
        let chain = chain_with_stars(3);
        {
            let mut blocks = chain.chain.write();
            blocks[1].body = star_block("thief", json!("stolen")).body;
            blocks[1].hash = blocks[1].compute_hash();
        }

        let faults = chain.integrity_faults();
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            faults[0],
            IntegrityFault::BrokenLink { height: 2, .. }
        ));
    }

    #[test]
    fn test_reports_every_fault_in_order() {
        let chain = chain_with_stars(4);
        {
            let mut blocks = chain.chain.write();
            blocks[1].time += 1;
            blocks[3].previous_block_hash = None;
            blocks[3].hash = blocks[3].compute_hash();
        }

        let faults = chain.integrity_faults();
        let heights: Vec<u64> = faults
            .iter()
            .map(|f| match f {
                IntegrityFault::HashMismatch { height, .. } => *height,
                IntegrityFault::BrokenLink { height, .. } => *height,
            })
            .collect();
        // resealing #3 changes its hash, so #4 no longer links either
        assert_eq!(heights, vec![1, 3, 4]);
        assert!(faults[1].to_string().contains("previousBlockHash is <none>"));
    }

    #[test]
    fn test_genesis_payload_edit_passes_self_validation() {
        let chain = chain_with_stars(1);
        chain.chain.write()[0].body = BlockPayload::genesis().encode().unwrap() + "00";
        assert!(chain.validate_chain().is_empty());
    }
}
