use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const GENESIS_DATA: &str = "Genesis Block";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisData {
    pub data: String,
}

/// A registered star together with the ownership proof that admitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    pub address: String,
    pub message: String,
    pub signature: String,
    pub star: serde_json::Value,
}

/// Decoded form of a block body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockPayload {
    Star(StarRecord),
    Genesis(GenesisData),
}

impl BlockPayload {
    pub fn genesis() -> Self {
        BlockPayload::Genesis(GenesisData {
            data: GENESIS_DATA.to_string(),
        })
    }

    /// Hex encoding of the payload's JSON document.
    pub fn encode(&self) -> Result<String> {
        Ok(hex::encode(serde_json::to_vec(self)?))
    }

    pub fn decode(body: &str) -> Result<Self> {
        let bytes = hex::decode(body)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// One ledger entry. Structural fields are filled in by the chain at append
/// time; a block built with [`Block::new`] is unsealed until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub(crate) hash: String,
    pub(crate) height: u64,
    pub(crate) body: String,
    pub(crate) time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) previous_block_hash: Option<String>,
}

impl Block {
    pub fn new(payload: &BlockPayload) -> Result<Self> {
        Ok(Block {
            hash: String::new(),
            height: 0,
            body: payload.encode()?,
            time: 0,
            previous_block_hash: None,
        })
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn previous_block_hash(&self) -> Option<&str> {
        self.previous_block_hash.as_deref()
    }

    pub fn decode_payload(&self) -> Result<BlockPayload> {
        BlockPayload::decode(&self.body)
    }

    /// SHA-256 over every field except `hash`, as lowercase hex.
    ///
    /// Variable-length fields are length-prefixed so that no two distinct
    /// blocks share a preimage.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.time.to_le_bytes());
        hasher.update((self.body.len() as u64).to_le_bytes());
        hasher.update(self.body.as_bytes());
        match &self.previous_block_hash {
            Some(prev) => {
                hasher.update([1u8]);
                hasher.update((prev.len() as u64).to_le_bytes());
                hasher.update(prev.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        hex::encode(hasher.finalize())
    }

    /// The genesis block is the root of trust and always passes.
    pub fn validate(&self) -> bool {
        if self.height == 0 {
            return true;
        }
        self.compute_hash() == self.hash
    }
}
