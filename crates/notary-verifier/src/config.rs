//! # Verifier configuration
//!
//! Mirrors the teacher workspace's small `*Config` structs (e.g.
//! `LightClientConfig`): a plain `Default` plus a `for_testing()`
//! constructor with smaller, deterministic values.

/// Configuration for a [`crate::verifier::Verifier`] instance.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Base URL of the notary server, e.g. `https://sum.golang.org`.
    /// Defaults to `https://<key-name>` per spec.md §6's CLI contract;
    /// the CLI resolves that default, this struct just stores the result.
    pub base_url: String,

    /// Tile height used by the server's tile layout (spec.md §4.3, §6).
    pub tile_height: u8,

    /// Module-path glob patterns to skip verification for, sourced from
    /// the `GONOVERIFY` environment variable (spec.md §6). A match means
    /// `Lookup` returns [`crate::verifier::LookupOutcome::Skipped`].
    pub skip_patterns: Vec<String>,
}

impl VerifierConfig {
    /// Build a config from a base URL and tile height, reading
    /// `GONOVERIFY` from the process environment.
    pub fn new(base_url: impl Into<String>, tile_height: u8) -> Self {
        Self {
            base_url: base_url.into(),
            tile_height,
            skip_patterns: Self::skip_patterns_from_env(),
        }
    }

    fn skip_patterns_from_env() -> Vec<String> {
        std::env::var("GONOVERIFY")
            .ok()
            .map(|v| v.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// A config for tests: no environment lookups, default tile height.
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tile_height: 8,
            skip_patterns: Vec::new(),
        }
    }
}
