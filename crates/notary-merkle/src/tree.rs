//! # Tree hashing and proofs
//!
//! Append-time hash computation ([`stored_hashes_for_append`]), tree root
//! computation ([`tree_hash`]), inclusion proofs ([`prove_record`] /
//! [`check_record`]) and consistency proofs ([`prove_tree`] /
//! [`check_tree`]).
//!
//! All recursion here walks `[lo, hi)` leaf ranges and is bounded by
//! `log2(tree size) <= 63`, so plain recursion is safe (no explicit stack
//! needed).

use notary_hash::{hash_node, Hash};

use crate::errors::MerkleError;
use crate::reader::HashReader;

/// Compute the hashes newly written when appending leaf `n` (0-indexed)
/// with content `data`. Spec.md §4.2.3.
pub fn stored_hashes_for_append<R: HashReader + ?Sized>(
    n: u64,
    data: &[u8],
    reader: &R,
) -> Result<Vec<Hash>, MerkleError> {
    let mut hashes = vec![notary_hash::record_hash(data)];
    let mut top = *hashes.last().unwrap();
    let mut level = 0u8;
    while (n >> level) & 1 == 1 {
        let sibling = reader.read_hash(level, (n >> level) - 1)?;
        top = hash_node(&sibling, &top);
        hashes.push(top);
        level += 1;
    }
    Ok(hashes)
}

/// Largest power of two strictly less than `size` (`size` must be `>= 2`).
fn split_point(size: u64) -> u64 {
    debug_assert!(size >= 2);
    1u64 << (63 - (size - 1).leading_zeros())
}

/// Hash of the subtree covering leaves `[lo, hi)`.
fn subtree_hash<R: HashReader + ?Sized>(lo: u64, hi: u64, reader: &R) -> Result<Hash, MerkleError> {
    if hi <= lo {
        return Err(MerkleError::InvalidInput(format!(
            "empty or inverted range [{lo}, {hi})"
        )));
    }
    if hi - lo == 1 {
        return reader.read_hash(0, lo);
    }
    let k = split_point(hi - lo);
    let level = k.trailing_zeros() as u8;
    let left = if lo % k == 0 {
        reader.read_hash(level, lo / k)?
    } else {
        subtree_hash(lo, lo + k, reader)?
    };
    let right = subtree_hash(lo + k, hi, reader)?;
    Ok(hash_node(&left, &right))
}

/// Root hash of the tree with `n` leaves. `n = 0` has no root hash.
pub fn tree_hash<R: HashReader + ?Sized>(n: u64, reader: &R) -> Result<Hash, MerkleError> {
    if n == 0 {
        return Err(MerkleError::InvalidInput(
            "tree with 0 leaves has no root hash".into(),
        ));
    }
    subtree_hash(0, n, reader)
}

/// Build an inclusion proof that leaf `target` (0-indexed) belongs to the
/// tree of size `tree_size`. Spec.md §4.2.5.
pub fn prove_record<R: HashReader + ?Sized>(
    tree_size: u64,
    target: u64,
    reader: &R,
) -> Result<Vec<Hash>, MerkleError> {
    if tree_size == 0 || target >= tree_size {
        return Err(MerkleError::InvalidInput(format!(
            "leaf {target} out of range for tree of size {tree_size}"
        )));
    }
    prove_record_range(0, tree_size, target, reader)
}

fn prove_record_range<R: HashReader + ?Sized>(
    lo: u64,
    hi: u64,
    target: u64,
    reader: &R,
) -> Result<Vec<Hash>, MerkleError> {
    if hi - lo == 1 {
        return Ok(Vec::new());
    }
    let k = split_point(hi - lo);
    let level = k.trailing_zeros() as u8;
    if target < lo + k {
        let mut proof = prove_record_range(lo, lo + k, target, reader)?;
        proof.push(subtree_hash(lo + k, hi, reader)?);
        Ok(proof)
    } else {
        let mut proof = prove_record_range(lo + k, hi, target, reader)?;
        let left = if lo % k == 0 {
            reader.read_hash(level, lo / k)?
        } else {
            subtree_hash(lo, lo + k, reader)?
        };
        proof.push(left);
        Ok(proof)
    }
}

/// Check an inclusion proof: does `leaf_hash` at `target` belong to the
/// tree of size `tree_size` with root `root`? Spec.md §4.2.5.
///
/// Constant-fail: no information about which step failed is leaked beyond
/// [`MerkleError::ProofFailed`].
pub fn check_record(
    proof: &[Hash],
    tree_size: u64,
    root: Hash,
    target: u64,
    leaf_hash: Hash,
) -> Result<(), MerkleError> {
    if tree_size == 0 || target >= tree_size {
        return Err(MerkleError::InvalidInput(format!(
            "leaf {target} out of range for tree of size {tree_size}"
        )));
    }
    let computed = check_record_range(0, tree_size, target, proof, leaf_hash)?;
    if computed == root {
        Ok(())
    } else {
        Err(MerkleError::ProofFailed)
    }
}

fn check_record_range(
    lo: u64,
    hi: u64,
    target: u64,
    proof: &[Hash],
    leaf_hash: Hash,
) -> Result<Hash, MerkleError> {
    if hi - lo == 1 {
        return if proof.is_empty() {
            Ok(leaf_hash)
        } else {
            Err(MerkleError::ProofFailed)
        };
    }
    let k = split_point(hi - lo);
    if proof.is_empty() {
        return Err(MerkleError::ProofFailed);
    }
    let (rest, &last) = proof.split_at(proof.len() - 1);
    if target < lo + k {
        let left = check_record_range(lo, lo + k, target, rest, leaf_hash)?;
        Ok(hash_node(&left, &last))
    } else {
        let right = check_record_range(lo + k, hi, target, rest, leaf_hash)?;
        Ok(hash_node(&last, &right))
    }
}

/// Build a consistency proof that the tree of size `n` is a prefix of the
/// tree of size `tree_size`. Spec.md §4.2.6. Empty when `n == tree_size`.
pub fn prove_tree<R: HashReader + ?Sized>(
    tree_size: u64,
    n: u64,
    reader: &R,
) -> Result<Vec<Hash>, MerkleError> {
    if n == 0 || n > tree_size {
        return Err(MerkleError::InvalidInput(format!(
            "n={n} out of range for tree of size {tree_size}"
        )));
    }
    if n == tree_size {
        return Ok(Vec::new());
    }
    prove_tree_range(0, tree_size, n, reader)
}

fn prove_tree_range<R: HashReader + ?Sized>(
    lo: u64,
    hi: u64,
    n: u64,
    reader: &R,
) -> Result<Vec<Hash>, MerkleError> {
    if n == hi - lo {
        return Ok(vec![subtree_hash(lo, hi, reader)?]);
    }
    let k = split_point(hi - lo);
    let level = k.trailing_zeros() as u8;
    if n <= k {
        let mut proof = prove_tree_range(lo, lo + k, n, reader)?;
        proof.push(subtree_hash(lo + k, hi, reader)?);
        Ok(proof)
    } else {
        let mut proof = prove_tree_range(lo + k, hi, n - k, reader)?;
        let left = if lo % k == 0 {
            reader.read_hash(level, lo / k)?
        } else {
            subtree_hash(lo, lo + k, reader)?
        };
        proof.push(left);
        Ok(proof)
    }
}

/// Check a consistency proof: is the `n`-leaf tree with root `h_old` a
/// prefix of the `tree_size`-leaf tree with root `h_new`? Spec.md §4.2.6.
pub fn check_tree(
    proof: &[Hash],
    tree_size: u64,
    h_new: Hash,
    n: u64,
    h_old: Hash,
) -> Result<(), MerkleError> {
    if n == 0 || n > tree_size {
        return Err(MerkleError::InvalidInput(format!(
            "n={n} out of range for tree of size {tree_size}"
        )));
    }
    if n == tree_size {
        return if proof.is_empty() && h_old == h_new {
            Ok(())
        } else {
            Err(MerkleError::ProofFailed)
        };
    }
    let (old_root, new_root) = check_tree_range(0, tree_size, n, proof)?;
    if old_root == h_old && new_root == h_new {
        Ok(())
    } else {
        Err(MerkleError::ProofFailed)
    }
}

fn check_tree_range(lo: u64, hi: u64, n: u64, proof: &[Hash]) -> Result<(Hash, Hash), MerkleError> {
    if n == hi - lo {
        if proof.len() != 1 {
            return Err(MerkleError::ProofFailed);
        }
        let h = proof[0];
        return Ok((h, h));
    }
    let k = split_point(hi - lo);
    if proof.is_empty() {
        return Err(MerkleError::ProofFailed);
    }
    let (rest, &last) = proof.split_at(proof.len() - 1);
    if n <= k {
        let (old_left, new_left) = check_tree_range(lo, lo + k, n, rest)?;
        let new_root = hash_node(&new_left, &last);
        Ok((old_left, new_root))
    } else {
        let (old_right, new_right) = check_tree_range(lo + k, hi, n - k, rest)?;
        let old_root = hash_node(&last, &old_right);
        let new_root = hash_node(&last, &new_right);
        Ok((old_root, new_root))
    }
}
