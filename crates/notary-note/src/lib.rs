//! Signed note container, Ed25519 key encoding, and typed tree-head /
//! sum-record codecs for the notarylog transparency log.
//!
//! This crate has no I/O: signing and verification operate on in-memory
//! byte slices and strings. Server- and client-side transport live in
//! `notary-verifier`.

pub mod errors;
pub mod key;
pub mod parse;
pub mod registry;
pub mod sign;
pub mod sum_record;
pub mod sumlines;
pub mod tree_head;

pub use errors::NoteError;
pub use key::{generate_key, Signer, Verifier};
pub use parse::{open, Note, OpenError, Signature};
pub use registry::VerifierList;
pub use sign::sign;
pub use sum_record::{manifest_lines, parse_gosum, GoSum, SumHash};
pub use tree_head::Tree;
