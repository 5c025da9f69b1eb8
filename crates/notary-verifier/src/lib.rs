//! Concurrent auditing client for the notarylog transparency log.
//!
//! A [`Verifier`](verifier::Verifier) tracks a monotonically advancing
//! signed tree head, cross-checks record lookups against it, and detects
//! forks between two signed heads that cannot both be prefixes of a single
//! timeline. This crate owns the only I/O-facing pieces of the core: the
//! blocking HTTP adapter (§4.7) and the optional on-disk cache (§6).

pub mod cache;
pub mod config;
pub mod errors;
pub mod fork;
pub mod glob;
pub mod http;
pub mod verifier;

pub use cache::{FsCache, NullCache, PersistentCache};
pub use config::VerifierConfig;
pub use errors::{HttpError, VerifierError};
pub use fork::ForkEvidence;
pub use http::{HttpClient, HttpFetcher};
pub use verifier::{LookupOutcome, Verifier};
