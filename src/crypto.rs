//! Cryptographic primitives for the star registry
//!
//! Addresses are the SHA-256 hash of a compressed secp256k1 public key,
//! rendered as 64 lowercase hex characters. Ownership of an address is proven
//! by a recoverable ECDSA signature over a prefixed message digest: the
//! verifier recovers the public key from the signature and compares the
//! derived address with the claimed one.

use crate::error::ChainError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::{RecoverableSignature, RecoveryId},
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Domain separator mixed into every signed message digest.
const SIGNED_MESSAGE_MAGIC: &str = "Star Registry Signed Message:\n";

/// Recovery id (0..=3) plus 64 compact bytes.
pub const MESSAGE_SIGNATURE_SIZE: usize = 65;

/// Header byte base for signatures made with a compressed public key.
const COMPRESSED_HEADER_BASE: u8 = 31;

/// Raw 32-byte address.
pub type Address = [u8; 32];

/// Convert an address to a hex string for display.
pub fn address_to_hex(addr: &Address) -> String {
    hex::encode(addr)
}

/// Convert a hex string to an address.
pub fn address_from_hex(hex_str: &str) -> Result<Address, ChainError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| ChainError::Crypto(format!("Invalid hex address: {}", e)))?;
    if bytes.len() != 32 {
        return Err(ChainError::Crypto(format!(
            "Address must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes
        .try_into()
        .map_err(|_| ChainError::Crypto("Failed to convert bytes into address".to_string()))
}

/// Derives the address controlled by a public key.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let pubkey_bytes: [u8; PUBLIC_KEY_SIZE] = public_key.serialize();
    Sha256::digest(pubkey_bytes).into()
}

fn write_compact_size(hasher: &mut Sha256, len: usize) {
    match len {
        0..=0xfc => hasher.update([len as u8]),
        0xfd..=0xffff => {
            hasher.update([0xfd]);
            hasher.update((len as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            hasher.update([0xfe]);
            hasher.update((len as u32).to_le_bytes());
        }
        _ => {
            hasher.update([0xff]);
            hasher.update((len as u64).to_le_bytes());
        }
    }
}

/// Double SHA-256 over the magic prefix and the length-prefixed message.
pub fn signed_message_digest(message: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    write_compact_size(&mut hasher, SIGNED_MESSAGE_MAGIC.len());
    hasher.update(SIGNED_MESSAGE_MAGIC.as_bytes());
    write_compact_size(&mut hasher, message.len());
    hasher.update(message.as_bytes());
    let first = hasher.finalize();
    Sha256::digest(first).into()
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::Crypto(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::Crypto(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| ChainError::Crypto(format!("Invalid hex secret key: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key)
    }

    /// The address as the hex string used in challenge messages and payloads.
    pub fn address_hex(&self) -> String {
        address_to_hex(&self.address())
    }

    /// Signs `message` and returns the base64 encoded 65-byte recoverable signature.
    pub fn sign_message(&self, message: &str) -> String {
        let digest = Message::from_digest(signed_message_digest(message));
        let signature = SECP256K1_CONTEXT.sign_ecdsa_recoverable(&digest, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut encoded = [0u8; MESSAGE_SIGNATURE_SIZE];
        encoded[0] = COMPRESSED_HEADER_BASE + recovery_id.to_i32() as u8;
        encoded[1..].copy_from_slice(&compact);
        STANDARD.encode(encoded)
    }
}

/// Checks that `signature` over `message` was produced by the key controlling `address`.
///
/// `Ok(false)` means the signature is well formed but proves nothing for this
/// address. `Err` is reserved for inputs the capability cannot interpret.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, address: &str, signature: &str) -> Result<bool, ChainError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Verifier;

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, message: &str, address: &str, signature: &str) -> Result<bool, ChainError> {
        let claimed = address_from_hex(address)?;

        let raw = STANDARD
            .decode(signature.trim())
            .map_err(|e| ChainError::Crypto(format!("Invalid base64 signature: {}", e)))?;
        if raw.len() != MESSAGE_SIGNATURE_SIZE {
            return Err(ChainError::Crypto(format!(
                "Signature must be exactly {} bytes, got {}",
                MESSAGE_SIGNATURE_SIZE,
                raw.len()
            )));
        }

        let header = raw[0];
        if !(27..=34).contains(&header) {
            return Err(ChainError::Crypto(format!(
                "Invalid signature header byte {}",
                header
            )));
        }
        let recovery_id = RecoveryId::from_i32(((header - 27) & 3) as i32)
            .map_err(|e| ChainError::Crypto(format!("Invalid recovery id: {}", e)))?;
        let recoverable = RecoverableSignature::from_compact(&raw[1..], recovery_id)
            .map_err(|e| ChainError::Crypto(format!("Invalid signature: {}", e)))?;

        let digest = Message::from_digest(signed_message_digest(message));
        match SECP256K1_CONTEXT.recover_ecdsa(&digest, &recoverable) {
            Ok(public_key) => Ok(address_from_public_key(&public_key) == claimed),
            Err(_) => Ok(false),
        }
    }
}
