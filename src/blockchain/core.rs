// core.rs splits ledger responsibilities into submodules: the block itself,
// the chain and its queries, ownership proofs, and integrity scanning.
pub mod block;
pub mod chain;
pub mod ownership;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use ownership::*;
pub use validation::*;
