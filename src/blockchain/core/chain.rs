use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, info_span, warn, Span};

use crate::clock::Clock;
use crate::config::RegistryConfig;
use crate::crypto::SignatureVerifier;
use crate::error::{ChainError, Result};

use super::block::{Block, BlockPayload};
use super::validation::scan_chain;

/// Result of an append: the sealed block plus whatever the post-append
/// integrity scan reported. Faults do not undo the append.
#[derive(Debug, Clone)]
pub struct AppendReceipt {
    pub block: Block,
    pub integrity_errors: Vec<String>,
}

/// The star registry ledger.
///
/// Blocks live behind a single lock: appends hold it exclusively for the
/// whole height/hash/push/validate sequence, reads share it and hand back
/// owned copies.
pub struct Blockchain {
    pub(crate) chain: RwLock<Vec<Block>>,
    pub(crate) verifier: Arc<dyn SignatureVerifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: RegistryConfig,
    pub(crate) span: Span,
}

impl Blockchain {
    /// Create a ledger with default registry settings and append its genesis block.
    pub fn new(verifier: Arc<dyn SignatureVerifier>, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_settings(verifier, clock, RegistryConfig::default())
    }

    pub fn with_settings(
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
        settings: RegistryConfig,
    ) -> Result<Self> {
        let blockchain = Blockchain {
            chain: RwLock::new(Vec::new()),
            verifier,
            clock,
            span: info_span!(
                "blockchain",
                challenge_window_secs = settings.challenge_window_secs
            ),
            settings,
        };
        blockchain.initialize_chain()?;
        Ok(blockchain)
    }

    pub fn settings(&self) -> &RegistryConfig {
        &self.settings
    }

    /// Appends the genesis block if the chain is empty. No-op otherwise.
    pub fn initialize_chain(&self) -> Result<()> {
        let _enter = self.span.enter();
        let mut chain = self.chain.write();
        if !chain.is_empty() {
            debug!(blocks = chain.len(), "chain already initialized");
            return Ok(());
        }

        let genesis = Block::new(&BlockPayload::genesis())?;
        let receipt = self.append_locked(&mut chain, genesis)?;
        info!(hash = %receipt.block.hash, "genesis block created");
        Ok(())
    }

    /// Seals `block` onto the tip of the chain.
    pub(crate) fn append_block(&self, block: Block) -> Result<AppendReceipt> {
        let _enter = self.span.enter();
        let mut chain = self.chain.write();
        self.append_locked(&mut chain, block)
    }

    fn append_locked(&self, chain: &mut Vec<Block>, mut block: Block) -> Result<AppendReceipt> {
        let current_height = match chain.last() {
            None => None,
            Some(tip) => {
                let expected = u64::try_from(chain.len() - 1).map_err(|_| {
                    ChainError::Append("chain length does not fit in a block height".to_string())
                })?;
                if tip.height != expected {
                    return Err(ChainError::Append(format!(
                        "tip reports height {} but the chain holds {} blocks",
                        tip.height,
                        chain.len()
                    )));
                }
                Some(expected)
            }
        };

        block.time = self.clock.now_unix();
        block.height = match current_height {
            None => 0,
            Some(h) => h
                .checked_add(1)
                .ok_or_else(|| ChainError::Append("block height overflow".to_string()))?,
        };
        block.previous_block_hash = chain.last().map(|tip| tip.hash.clone());
        block.hash = block.compute_hash();

        chain.push(block.clone());

        let integrity_errors: Vec<String> =
            scan_chain(chain).iter().map(ToString::to_string).collect();
        if !integrity_errors.is_empty() {
            error!(
                height = block.height,
                faults = integrity_errors.len(),
                "chain integrity check failed after append"
            );
        }

        info!(height = block.height, hash = %block.hash, "block appended");
        Ok(AppendReceipt {
            block,
            integrity_errors,
        })
    }

    /// Height of the tip; the genesis block is height 0.
    pub fn chain_height(&self) -> u64 {
        (self.chain.read().len() as u64).saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Owned copy of every block, genesis first.
    pub fn snapshot(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    pub fn get_block_by_hash(&self, hash: &str) -> Option<Block> {
        self.chain.read().iter().find(|b| b.hash == hash).cloned()
    }

    pub fn get_block_by_height(&self, height: u64) -> Option<Block> {
        self.chain.read().iter().find(|b| b.height == height).cloned()
    }

    /// Stars registered by `address`, in chain order. Blocks whose body
    /// cannot be decoded are reported and skipped.
    pub fn get_stars_by_wallet_address(&self, address: &str) -> Vec<serde_json::Value> {
        let _enter = self.span.enter();
        let chain = self.chain.read();

        chain
            .iter()
            .skip(1)
            .fold(Vec::new(), |mut stars, block| {
                match block.decode_payload() {
                    Ok(BlockPayload::Star(record)) if record.address == address => {
                        stars.push(record.star);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(height = block.height, error = %e, "skipping undecodable block");
                    }
                }
                stars
            })
    }
}
