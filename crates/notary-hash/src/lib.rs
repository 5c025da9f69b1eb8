//! # Hash primitives
//!
//! Record and interior-node hashing for the notarylog transparency log,
//! plus the base64 codec used to print and parse hashes.
//!
//! ## Components
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`record_hash`] | Leaf hash of an opaque record payload |
//! | [`hash_node`] | Interior-node hash of two children |
//! | [`parse_hash`] | Strict base64 decode into a [`Hash`] |
//! | [`format_hash`] | Standard base64 encode (with padding) |

#![warn(missing_docs)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A 32-byte SHA-256 digest, as stored and compared throughout the log.
pub type Hash = [u8; 32];

/// Errors raised while parsing a hash from its textual form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The input was not valid base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    /// The decoded input was not exactly 32 bytes.
    #[error("invalid hash length: got {got} bytes, want 32")]
    InvalidLength {
        /// Number of bytes actually decoded.
        got: usize,
    },
}

/// Leaf-tag byte prepended before hashing a record's content.
const RECORD_TAG: u8 = 0x00;

/// Interior-node tag byte prepended before hashing two children together.
const NODE_TAG: u8 = 0x01;

/// Hash a record's raw content: `SHA-256(0x00 || content)`.
pub fn record_hash(content: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([RECORD_TAG]);
    hasher.update(content);
    finalize(hasher)
}

/// Hash two child nodes together: `SHA-256(0x01 || left || right)`.
pub fn hash_node(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_TAG]);
    hasher.update(left);
    hasher.update(right);
    finalize(hasher)
}

fn finalize(hasher: Sha256) -> Hash {
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Parse a standard-alphabet, padded base64 string into a [`Hash`].
///
/// Rejects anything that does not decode to exactly 32 bytes.
pub fn parse_hash(s: &str) -> Result<Hash, HashError> {
    let bytes = STANDARD
        .decode(s)
        .map_err(|e| HashError::InvalidBase64(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(HashError::InvalidLength { got: bytes.len() });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Format a [`Hash`] as standard-alphabet base64 with padding.
pub fn format_hash(h: &Hash) -> String {
    STANDARD.encode(h)
}
