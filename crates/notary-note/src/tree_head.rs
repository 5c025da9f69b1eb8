//! # Tree-head note
//!
//! Typed wrapper around the signed-note text `go notary tree\n<N>\n<base64
//! root hash>\n`. Spec.md §4.5.5.

use notary_hash::{format_hash, parse_hash, Hash};

use crate::errors::NoteError;

const PREFIX: &str = "go notary tree\n";
const MAX_LEN: usize = 1000;

/// A tree head: `(N, root hash)`. `N = 0` has no meaningful root; callers
/// at that size should not attempt to format or rely on the hash field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tree {
    pub n: u64,
    pub hash: Hash,
}

/// Format a tree head as signed-note text. Spec.md §4.5.5, Scenario B.
pub fn format_tree(tree: &Tree) -> String {
    format!("{PREFIX}{}\n{}\n", tree.n, format_hash(&tree.hash))
}

/// Parse signed-note text into a tree head. Spec.md §4.5.5.
///
/// Enforces: `go notary tree\n` prefix, exactly three newlines, total
/// length at most 1000 bytes, a canonical (no leading zero, no `+`, no
/// whitespace) decimal leaf count, and a base64-encoded 32-byte root hash.
pub fn parse_tree(data: &[u8]) -> Result<Tree, NoteError> {
    if data.len() > MAX_LEN {
        return Err(NoteError::Malformed(format!(
            "tree note is {} bytes, max is {MAX_LEN}",
            data.len()
        )));
    }
    let s = std::str::from_utf8(data)
        .map_err(|_| NoteError::Malformed("tree note is not valid UTF-8".into()))?;
    let rest = s
        .strip_prefix(PREFIX)
        .ok_or_else(|| NoteError::Malformed("tree note missing \"go notary tree\" prefix".into()))?;
    if rest.bytes().filter(|&b| b == b'\n').count() != 2 {
        return Err(NoteError::Malformed(
            "tree note must have exactly three newlines".into(),
        ));
    }
    let mut lines = rest.split('\n');
    let n_line = lines.next().unwrap_or_default();
    let hash_line = lines.next().unwrap_or_default();
    let trailer = lines.next().unwrap_or("x");
    if !trailer.is_empty() {
        return Err(NoteError::Malformed("tree note must end with a newline".into()));
    }

    let n: u64 = n_line
        .parse()
        .map_err(|_| NoteError::Malformed(format!("tree size {n_line:?} is not a valid integer")))?;
    if n_line != n.to_string() {
        return Err(NoteError::Malformed(format!(
            "tree size {n_line:?} is not canonical"
        )));
    }

    let hash = parse_hash(hash_line)
        .map_err(|e| NoteError::Malformed(format!("tree root hash: {e}")))?;

    Ok(Tree { n, hash })
}
