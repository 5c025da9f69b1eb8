//! # Verifier registry
//!
//! Resolves `(name, fingerprint)` to a registered [`Verifier`], reporting
//! ambiguity when two distinct keys share an identity. Spec.md §4.5.2.

use std::collections::HashMap;

use crate::errors::NoteError;
use crate::key::Verifier;

/// A set of trusted verifier keys, indexed by `(name, fingerprint)`.
pub struct VerifierList {
    by_identity: HashMap<(String, u32), Vec<Verifier>>,
}

impl VerifierList {
    pub fn new() -> Self {
        Self {
            by_identity: HashMap::new(),
        }
    }

    /// Register a verifier. Multiple registrations under the same
    /// `(name, fingerprint)` are kept and later reported as ambiguous.
    pub fn add(&mut self, verifier: Verifier) {
        let key = (verifier.name().to_string(), verifier.fingerprint());
        self.by_identity.entry(key).or_default().push(verifier);
    }

    pub fn from_keys(verifiers: impl IntoIterator<Item = Verifier>) -> Self {
        let mut list = Self::new();
        for v in verifiers {
            list.add(v);
        }
        list
    }

    /// Resolve a `(name, fingerprint)` pair to its verifier.
    pub fn find(&self, name: &str, fingerprint: u32) -> Result<&Verifier, NoteError> {
        match self.by_identity.get(&(name.to_string(), fingerprint)) {
            None | Some([]) => Err(NoteError::UnknownKey {
                name: name.to_string(),
                fingerprint,
            }),
            Some([single]) => Ok(single),
            Some(_) => Err(NoteError::AmbiguousKey {
                name: name.to_string(),
                fingerprint,
            }),
        }
    }
}

impl Default for VerifierList {
    fn default() -> Self {
        Self::new()
    }
}
