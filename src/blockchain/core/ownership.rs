//! Time-boxed challenge/response proof of address ownership.
//!
//! A challenge is `"{address}:{unix_seconds}:{suffix}"`. Nothing is stored
//! when it is issued; the embedded timestamp is checked again on submission.

use tracing::{info, warn};

use crate::error::{ChainError, Result};

use super::block::{Block, BlockPayload, StarRecord};
use super::chain::Blockchain;

/// Extracts the issue timestamp from a challenge message.
pub fn parse_challenge_timestamp(message: &str, suffix: &str) -> Result<i64> {
    let parts: Vec<&str> = message.split(':').collect();
    if parts.len() != 3 {
        return Err(ChainError::MalformedMessage(format!(
            "expected <address>:<timestamp>:{}, got {} field(s)",
            suffix,
            parts.len()
        )));
    }
    if parts[2] != suffix {
        return Err(ChainError::MalformedMessage(format!(
            "unexpected suffix {:?}",
            parts[2]
        )));
    }
    parts[1]
        .parse::<i64>()
        .map_err(|e| ChainError::MalformedMessage(format!("invalid timestamp {:?}: {}", parts[1], e)))
}

impl Blockchain {
    pub fn request_ownership_message(&self, address: &str) -> String {
        format!(
            "{}:{}:{}",
            address,
            self.clock.now_unix(),
            self.settings.message_suffix
        )
    }

    /// Verifies the ownership proof and registers `star` in a new block.
    ///
    /// The freshness check runs before signature verification, so a stale
    /// challenge is rejected whatever its signature.
    pub fn submit_star(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: serde_json::Value,
    ) -> Result<Block> {
        let _enter = self.span.enter();

        let issued_at = parse_challenge_timestamp(message, &self.settings.message_suffix)?;
        let elapsed = self.clock.now_unix().saturating_sub(issued_at);
        let window = self.settings.challenge_window_secs;
        if elapsed > i64::try_from(window).unwrap_or(i64::MAX) {
            warn!(%address, elapsed, "ownership challenge expired");
            return Err(ChainError::ExpiredChallenge { elapsed, window });
        }

        match self.verifier.verify(message, address, signature) {
            Ok(true) => {}
            Ok(false) => {
                warn!(%address, "signature does not match address");
                return Err(ChainError::InvalidSignature);
            }
            Err(e) => {
                warn!(%address, error = %e, "signature verification failed");
                return Err(ChainError::Verification(Box::new(e)));
            }
        }

        let block = Block::new(&BlockPayload::Star(StarRecord {
            address: address.to_string(),
            message: message.to_string(),
            signature: signature.to_string(),
            star,
        }))?;
        let receipt = self.append_block(block)?;
        for fault in &receipt.integrity_errors {
            warn!(%fault, "pre-existing chain fault");
        }

        info!(%address, height = receipt.block.height(), "star registered");
        Ok(receipt.block)
    }
}
