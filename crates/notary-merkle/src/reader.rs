//! # `HashReader` — the sole polymorphic seam
//!
//! A narrow capability interface satisfied by the log server's own storage
//! and, on the client side, by the tile reader. Kept intentionally to two
//! methods.

use notary_hash::Hash;

use crate::errors::MerkleError;

/// Abstract source of stored hashes.
///
/// Implementations are free to deduplicate, parallelize, and reorder work
/// internally; `read_hashes` must still return results positionally aligned
/// with the requested indexes.
pub trait HashReader: Send + Sync {
    /// Read a single hash at `(level, n)`, used by the log server that owns
    /// storage directly.
    fn read_hash(&self, level: u8, n: u64) -> Result<Hash, MerkleError> {
        let index = crate::index::stored_hash_index(level, n);
        let hashes = self.read_hashes(&[index])?;
        hashes
            .into_iter()
            .next()
            .ok_or_else(|| MerkleError::ReaderError("short read".into()))
    }

    /// Read a batch of hashes by storage index, used by the verifier side.
    ///
    /// A short return (fewer hashes than indexes requested) is an error.
    fn read_hashes(&self, indexes: &[u64]) -> Result<Vec<Hash>, MerkleError>;
}

/// In-memory [`HashReader`] backing storage, used by the log server side and
/// by tests. Mirrors the role of an in-memory key-value store adapter: a
/// plain `Vec` indexed by storage index, with no persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryHashReader {
    hashes: Vec<Hash>,
}

impl MemoryHashReader {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the log, computing and storing the new hashes
    /// produced by `StoredHashes` (spec.md §4.2.3).
    ///
    /// Returns the new leaf's 0-indexed position.
    pub fn append(&mut self, data: &[u8]) -> Result<u64, MerkleError> {
        let n = self.num_leaves();
        let mut hashes = crate::tree::stored_hashes_for_append(n, data, self)?;
        self.hashes.append(&mut hashes);
        Ok(n)
    }

    /// Number of leaves written so far.
    pub fn num_leaves(&self) -> u64 {
        // Inverse of stored_hash_count: find n such that len == stored_hash_count(n).
        let mut lo = 0u64;
        let mut hi = self.hashes.len() as u64;
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if crate::index::stored_hash_count(mid) <= self.hashes.len() as u64 {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }

    /// Raw stored hashes, in storage-index order. Used by the tile codec
    /// and by tests that compare tile bytes against storage directly.
    pub fn raw_hashes(&self) -> &[Hash] {
        &self.hashes
    }
}

impl HashReader for MemoryHashReader {
    fn read_hashes(&self, indexes: &[u64]) -> Result<Vec<Hash>, MerkleError> {
        indexes
            .iter()
            .map(|&i| {
                self.hashes
                    .get(i as usize)
                    .copied()
                    .ok_or_else(|| MerkleError::ReaderError(format!("index {i} not stored")))
            })
            .collect()
    }
}
