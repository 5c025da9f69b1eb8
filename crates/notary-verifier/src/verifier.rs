//! # Verifier
//!
//! The auditing client: monotonic tree-head tracking, fork detection, and
//! manifest-line lookups cross-checked against the log. A `Verifier<F>` is
//! generic over the HTTP transport (`F: HttpFetcher`) so tests can swap in
//! an in-memory fake; production code uses `HttpClient`.

use std::sync::{Arc, Mutex};

use notary_hash::{record_hash, Hash};
use notary_merkle::reader::HashReader;
use notary_merkle::tile_reader::TileFetcher;
use notary_merkle::{prove_tree, stored_hash_index, tree_hash, check_tree, MerkleError, Tile, TileReader};
use notary_note::tree_head::{parse_tree, Tree};
use notary_note::sum_record::{manifest_lines, parse_gosum};
use notary_note::VerifierList;

use crate::cache::PersistentCache;
use crate::config::VerifierConfig;
use crate::errors::VerifierError;
use crate::fork::{self, ForkEvidence};
use crate::glob;
use crate::http::{HttpFetcher, HttpTileFetcher};

/// Outcome of a [`Verifier::lookup`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The module path matched a `GONOVERIFY` pattern; no verification
    /// was performed.
    Skipped,
    /// The record was cross-checked against the log; these are the
    /// manifest lines for `<path> <version>` and `<path> <version>/go.mod`.
    Verified(Vec<String>),
}

#[derive(Clone)]
struct LatestState {
    tree: Tree,
    signed: Vec<u8>,
}

/// Tile fetcher that consults a [`PersistentCache`] before falling back to
/// HTTP, and writes freshly fetched tiles back to it. Spec.md §6's
/// persisted-state layout, grounded on the teacher's file-backed adapter.
struct CachingTileFetcher<F: HttpFetcher> {
    inner: HttpTileFetcher<F>,
    cache: Option<Arc<dyn PersistentCache>>,
}

impl<F: HttpFetcher> TileFetcher for CachingTileFetcher<F> {
    fn fetch_tile(&self, tile: &Tile) -> Result<Vec<u8>, MerkleError> {
        if let Some(cache) = &self.cache {
            if let Some(data) = cache.load_tile(tile) {
                return Ok(data);
            }
        }
        let data = self.inner.fetch_tile(tile)?;
        if let Some(cache) = &self.cache {
            cache.save_tile(tile, &data);
        }
        Ok(data)
    }
}

/// A [`HashReader`] over a fixed, trusted tree head: every read first
/// recomputes the root from the tile reader and rejects if it disagrees
/// with `tree.hash`, before answering the caller's actual indexes.
/// Spec.md §4.6.4.
struct TileHashReader<'a, F: TileFetcher> {
    tree: Tree,
    inner: &'a TileReader<F>,
}

impl<'a, F: TileFetcher> HashReader for TileHashReader<'a, F> {
    fn read_hashes(&self, indexes: &[u64]) -> Result<Vec<Hash>, MerkleError> {
        if self.tree.n > 0 {
            let got = tree_hash(self.tree.n, self.inner)?;
            if got != self.tree.hash {
                return Err(MerkleError::ReaderError(
                    "tile-derived root does not match the tree head it was checked against".into(),
                ));
            }
        }
        self.inner.read_hashes(indexes)
    }
}

/// Concurrent auditing client. `F` is the HTTP transport; `Verifier` itself
/// is `Send + Sync` and safe to share across threads (spec.md §5).
pub struct Verifier<F: HttpFetcher + 'static> {
    config: VerifierConfig,
    http: Arc<F>,
    verifiers: VerifierList,
    cache: Option<Arc<dyn PersistentCache>>,
    tile_reader: TileReader<CachingTileFetcher<F>>,
    latest: Mutex<Option<LatestState>>,
}

impl<F: HttpFetcher + 'static> Verifier<F> {
    pub fn new(
        config: VerifierConfig,
        http: F,
        verifiers: VerifierList,
        cache: Option<Arc<dyn PersistentCache>>,
    ) -> Self {
        let http = Arc::new(http);
        let fetcher = CachingTileFetcher {
            inner: HttpTileFetcher::new(config.base_url.clone(), Arc::clone(&http)),
            cache: cache.clone(),
        };
        let tile_reader = TileReader::new(config.tile_height, fetcher);

        let latest = cache
            .as_ref()
            .and_then(|c| c.load_latest())
            .and_then(|signed| {
                let note = notary_note::open(&signed, &verifiers).ok()?;
                let tree = parse_tree(note.text.as_bytes()).ok()?;
                Some(LatestState { tree, signed })
            });

        Self {
            config,
            http,
            verifiers,
            cache,
            tile_reader,
            latest: Mutex::new(latest),
        }
    }

    /// The most recently committed, cross-checked tree head, if any head
    /// has been accepted yet.
    pub fn current_tree(&self) -> Option<Tree> {
        self.latest.lock().expect("latest mutex poisoned").as_ref().map(|s| s.tree)
    }

    /// Fetch `/latest` and feed it through [`Self::update_latest`].
    pub fn refresh_latest(&self) -> Result<Tree, VerifierError> {
        let url = format!("{}/latest", self.config.base_url);
        let body = self.http.get_url(&url)?;
        self.update_latest(&body)
    }

    /// Verify and, if consistent, commit a signed tree-head note as the new
    /// `latest`. Spec.md §4.6.1.
    pub fn update_latest(&self, signed_note: &[u8]) -> Result<Tree, VerifierError> {
        let note = notary_note::open(signed_note, &self.verifiers).map_err(|e| e.error)?;
        let candidate = parse_tree(note.text.as_bytes())?;

        loop {
            let current = self.latest.lock().expect("latest mutex poisoned").clone();
            let (current_tree, current_signed) = match &current {
                Some(state) => (state.tree, state.signed.clone()),
                None => (Tree { n: 0, hash: [0u8; 32] }, Vec::new()),
            };

            if candidate.n <= current_tree.n {
                self.check_trees(candidate, signed_note, current_tree, &current_signed)?;
                return Ok(current_tree);
            }

            self.check_trees(current_tree, &current_signed, candidate, signed_note)?;

            let mut guard = self.latest.lock().expect("latest mutex poisoned");
            let guard_n = guard.as_ref().map(|s| s.tree.n).unwrap_or(0);
            if guard_n == current_tree.n {
                *guard = Some(LatestState {
                    tree: candidate,
                    signed: signed_note.to_vec(),
                });
                drop(guard);
                if let Some(cache) = &self.cache {
                    cache.save_latest(signed_note);
                }
                return Ok(candidate);
            }
            // A concurrent writer moved `latest` since the snapshot; loop
            // back and re-evaluate against the fresh state. If that writer
            // left an incompatible value, `check_trees` will detect and
            // terminate on the retry.
        }
    }

    /// Check that `older` is a prefix of `newer`. Spec.md §4.6.3.
    ///
    /// A genuine inconsistency (both a tile-derived mismatch *and* a
    /// consistency proof confirming it) is fatal: see
    /// [`crate::fork::terminate`].
    fn check_trees(
        &self,
        older: Tree,
        older_signed: &[u8],
        newer: Tree,
        newer_signed: &[u8],
    ) -> Result<(), VerifierError> {
        if older.n == 0 {
            return Ok(());
        }
        let reader = TileHashReader { tree: newer, inner: &self.tile_reader };
        let h = tree_hash(older.n, &reader)?;
        if h == older.hash {
            return Ok(());
        }
        let proof = prove_tree(newer.n, older.n, &reader)?;
        match check_tree(&proof, newer.n, newer.hash, older.n, h) {
            Ok(()) => fork::terminate(ForkEvidence {
                older,
                newer,
                older_signed: older_signed.to_vec(),
                newer_signed: newer_signed.to_vec(),
                proof,
            }),
            Err(_) => Err(VerifierError::TileMismatch(format!(
                "tile-derived root for a tree of size {} disagrees with its signed head, \
                 but a consistency proof against the tree of size {} did not confirm a fork",
                older.n, newer.n
            ))),
        }
    }

    /// Look up a module's record and cross-check it against the log.
    /// Spec.md §4.6, §4.6.2.
    pub fn lookup(&self, module_path: &str, version: &str) -> Result<LookupOutcome, VerifierError> {
        if glob::matches_any(&self.config.skip_patterns, module_path) {
            return Ok(LookupOutcome::Skipped);
        }

        let url = format!("{}/lookup/{module_path}@{version}", self.config.base_url);
        let body = self.http.get_url(&url)?;
        let (leaf_index, record_body, signed_head) = split_lookup_response(&body)?;

        if let Some(signed) = &signed_head {
            self.update_latest(signed)?;
        }

        let latest = self.current_tree().ok_or_else(|| {
            VerifierError::InvalidInput(
                "no tree head available yet; fetch /latest before looking up records".into(),
            )
        })?;

        if leaf_index >= latest.n {
            return Err(VerifierError::InvalidInput(format!(
                "leaf index {leaf_index} is not yet included in a tree of size {}",
                latest.n
            )));
        }

        let reader = TileHashReader { tree: latest, inner: &self.tile_reader };
        let stored_index = stored_hash_index(0, leaf_index);
        let leaf_hash = reader
            .read_hashes(&[stored_index])?
            .into_iter()
            .next()
            .expect("read_hashes returns one hash per requested index");
        if leaf_hash != record_hash(&record_body) {
            return Err(VerifierError::TileMismatch(format!(
                "record at leaf {leaf_index} does not match its hash in the log"
            )));
        }

        let sum = parse_gosum(&record_body)?;
        if sum.path != module_path || sum.version != version {
            return Err(VerifierError::InvalidInput(format!(
                "server returned a record for {} {} when {module_path} {version} was requested",
                sum.path, sum.version
            )));
        }

        Ok(LookupOutcome::Verified(manifest_lines(&sum)))
    }
}

/// Split a `/lookup` response body into `(leaf index, record body, signed
/// head)`. Spec.md §6: "decimal leaf id `\n` record body `\n` optional
/// (blank line `\n` signed head)".
fn split_lookup_response(body: &[u8]) -> Result<(u64, Vec<u8>, Option<Vec<u8>>), VerifierError> {
    let s = std::str::from_utf8(body)
        .map_err(|_| VerifierError::InvalidInput("lookup response is not valid UTF-8".into()))?;
    let (first_line, rest) = s
        .split_once('\n')
        .ok_or_else(|| VerifierError::InvalidInput("lookup response missing leaf index line".into()))?;
    let leaf_index: u64 = first_line.parse().map_err(|_| {
        VerifierError::InvalidInput(format!("lookup response leaf index {first_line:?} is not a valid integer"))
    })?;

    let (record_body, signed_head) = match rest.find("\n\n") {
        Some(pos) => (&rest[..pos + 1], Some(rest[pos + 2..].as_bytes().to_vec())),
        None => (rest, None),
    };
    let signed_head = signed_head.filter(|b| !b.is_empty());
    Ok((leaf_index, record_body.as_bytes().to_vec(), signed_head))
}
