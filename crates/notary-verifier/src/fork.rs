//! # Fork evidence and fatal termination
//!
//! A detected fork — two signed tree heads that cannot both be prefixes of
//! a single timeline — is the one error kind the Verifier does not
//! propagate as an ordinary `Result`: spec.md §4.6.3 and §9 call for an
//! immediate fatal log carrying both signed notes and the proof of
//! misbehavior, because continuing to serve under evidence of server
//! misbehavior is worse than crashing.
//!
//! [`terminate`] is the single choke point for that behavior so tests can
//! observe the evidence instead of aborting the test process; production
//! callers (the `notecheck` binary) let it abort.

use notary_hash::Hash;
use notary_note::tree_head::Tree;

/// Everything needed to reconstruct why two tree heads were judged
/// inconsistent: both signed notes, the older/newer tree-head pairs, and
/// the consistency proof that, on checking, revealed the contradiction.
#[derive(Debug, Clone)]
pub struct ForkEvidence {
    pub older: Tree,
    pub newer: Tree,
    pub older_signed: Vec<u8>,
    pub newer_signed: Vec<u8>,
    pub proof: Vec<Hash>,
}

impl std::fmt::Display for ForkEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SECURITY ERROR: notary log has fork")?;
        writeln!(f, "older tree ({} leaves):", self.older.n)?;
        writeln!(f, "{}", String::from_utf8_lossy(&self.older_signed))?;
        writeln!(f, "newer tree ({} leaves):", self.newer.n)?;
        writeln!(f, "{}", String::from_utf8_lossy(&self.newer_signed))?;
        write!(f, "proof has {} elements", self.proof.len())
    }
}

/// Log `evidence` as a structured fatal error and terminate the process.
///
/// Under `cfg(test)` or the `test-util` feature this panics instead of
/// aborting, so `#[should_panic]` tests — including the `tests/`
/// integration crate, which depends on this one as an ordinary library and
/// so does not get `cfg(test)` for free — can observe the evidence message.
/// In all other builds it aborts the process per spec.md §9 ("Fatal
/// termination on fork").
pub fn terminate(evidence: ForkEvidence) -> ! {
    tracing::error!(
        older_n = evidence.older.n,
        newer_n = evidence.newer.n,
        "{}",
        evidence
    );
    if cfg!(any(test, feature = "test-util")) {
        panic!("fork detected:\n{evidence}");
    } else {
        eprintln!("{evidence}");
        std::process::abort();
    }
}
