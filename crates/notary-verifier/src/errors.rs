//! Error kinds for the HTTP adapter and the verifier loop.

use thiserror::Error;

use notary_merkle::MerkleError;
use notary_note::NoteError;

/// Errors raised by the blocking HTTP adapter. Spec.md §4.7, §7.
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    /// The request could not be sent or the connection failed.
    #[error("transport error fetching {url}: {detail}")]
    Transport { url: String, detail: String },

    /// The server responded with a non-200 status.
    #[error("transport error fetching {url}: server returned status {status}")]
    Status { url: String, status: u16 },

    /// The response body exceeded the 1 MiB cap, or was shorter than its
    /// declared/expected length.
    #[error("transport error fetching {url}: {detail}")]
    BodyShape { url: String, detail: String },
}

/// Errors raised by the Verifier loop. Spec.md §7.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// A note, tree-head, or sum-record parse failed.
    #[error(transparent)]
    Note(#[from] NoteError),

    /// A Merkle proof or tile operation failed.
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// An HTTP fetch failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A leaf's recomputed hash differed from the one stored in the log,
    /// or a tile-derived root differed from the tree head it was checked
    /// against.
    #[error("tile mismatch: {0}")]
    TileMismatch(String),

    /// A proof-construction argument was out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
