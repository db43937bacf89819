//! Error types for the star registry

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// A block body is not valid hex, or does not hold a known payload document.
    #[error("Payload decode error: {0}")]
    Decode(String),

    #[error("Malformed ownership message: {0}")]
    MalformedMessage(String),

    #[error("Ownership challenge expired: issued {elapsed}s ago, window is {window}s")]
    ExpiredChallenge { elapsed: i64, window: u64 },

    #[error("Signature does not prove ownership of the address")]
    InvalidSignature,

    /// The verification capability itself failed (bad encodings, unusable key material).
    #[error("Signature verification failed: {0}")]
    Verification(#[source] Box<ChainError>),

    #[error("Could not append block: {0}")]
    Append(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Decode(err.to_string())
    }
}

impl From<hex::FromHexError> for ChainError {
    fn from(err: hex::FromHexError) -> Self {
        ChainError::Decode(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_verification_error_keeps_its_cause() {
        let err = ChainError::Verification(Box::new(ChainError::Crypto(
            "Invalid base64 signature".to_string(),
        )));
        assert_eq!(
            err.to_string(),
            "Signature verification failed: Cryptographic error: Invalid base64 signature"
        );
        let source = err.source().expect("wrapped cause");
        assert_eq!(source.to_string(), "Cryptographic error: Invalid base64 signature");
    }

    #[test]
    fn test_expired_challenge_message() {
        let err = ChainError::ExpiredChallenge {
            elapsed: 301,
            window: 300,
        };
        assert_eq!(
            err.to_string(),
            "Ownership challenge expired: issued 301s ago, window is 300s"
        );
    }
}
