//! Error kinds for the Merkle algebra and tile codec.

use thiserror::Error;

/// Errors raised by proof construction, proof checking, and the tile codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A proof argument was out of range (e.g. leaf index >= tree size).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A proof failed to reconstruct the expected root, or had the wrong
    /// shape. Deliberately uninformative about which step failed.
    #[error("proof failed")]
    ProofFailed,

    /// The underlying `HashReader` returned an error.
    #[error("reader error: {0}")]
    ReaderError(String),

    /// A tile path or tile body did not round-trip or had an invalid shape.
    #[error("tile error: {0}")]
    TileError(String),
}
