//! Cross-crate integration scenarios.
//!
//! Each test composes the server-side pieces (`notary-merkle` storage +
//! `notary-note` signing) with the client-side `notary-verifier::Verifier`
//! over an in-memory HTTP double, the way a real `notecheck` run would
//! compose them over the network.

#[cfg(test)]
mod support;

#[cfg(test)]
mod cache_persistence;
#[cfg(test)]
mod fork_detection;
#[cfg(test)]
mod gonoverify;
#[cfg(test)]
mod manifest_mismatch;
#[cfg(test)]
mod round_trip;
