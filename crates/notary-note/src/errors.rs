//! Error kinds for note parsing, signing, and key handling.

use thiserror::Error;

/// Errors raised by the note codec, key encoding, and the verifier
/// registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// Note text or signature block did not meet the wire-format rules.
    #[error("malformed note: {0}")]
    Malformed(String),

    /// A signature referenced a `(name, fingerprint)` pair not present in
    /// the verifier registry. Non-fatal: the signature is kept, unverified.
    #[error("unknown key: {name}+{fingerprint:08x}")]
    UnknownKey { name: String, fingerprint: u32 },

    /// Two distinct verifiers were registered under the same
    /// `(name, fingerprint)` identity.
    #[error("ambiguous key: {name}+{fingerprint:08x}")]
    AmbiguousKey { name: String, fingerprint: u32 },

    /// A signature against a registered key failed Ed25519 verification.
    #[error("invalid signature from {name}+{fingerprint:08x}")]
    InvalidSignature { name: String, fingerprint: u32 },

    /// No signature in the note verified against any registered key. The
    /// parsed note (with unverified signatures) is still attached so the
    /// caller may inspect it.
    #[error("no verified signatures")]
    NoVerifiedSignatures,

    /// A verifier/signer key string was malformed, or its embedded
    /// fingerprint did not match the one derived from its key material.
    #[error("bad key encoding: {0}")]
    BadKey(String),
}
