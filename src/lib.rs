//! Star Registry - an in-memory, hash-linked ledger of stars
//!
//! Each block after genesis records a star claimed by a wallet address. A
//! claim is only accepted with a fresh, signed ownership challenge.
//!
//! # Architecture
//!
//! ## Ledger
//! - [`blockchain`] - Blocks, chain append and queries, ownership proofs, integrity scanning
//!
//! ## Cryptography
//! - [`crypto`] - Key pairs, message signing and signature verification (secp256k1)
//!
//! ## Integration
//! - [`api`] - REST API over the ledger
//!
//! ## Configuration & Utilities
//! - [`clock`] - Time sources
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger
// ============================================================================
pub mod blockchain;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod clock;
pub mod config;
pub mod error;
