//! Proves a [`FsCache`]-backed tile cache actually bypasses the transport
//! on a hit, by reusing one on-disk cache directory across two independent
//! `Verifier` instances and then cutting off the tile transport entirely.

use std::sync::Arc;

use notary_verifier::{FsCache, LookupOutcome, PersistentCache, Verifier, VerifierConfig};
use notary_note::VerifierList;

use super::support::{FakeHttp, Server};

#[test]
fn a_second_verifier_sharing_the_cache_survives_an_offline_tile_transport() {
    let (server, note_verifier) = Server::new(2);
    let server = Arc::new(server);
    server.append("cached.example", "v1.0.0");

    let dir = tempfile::tempdir().unwrap();
    let base = "https://example.com/notary".to_string();

    // First verifier: the tile transport is live, so it warms the cache
    // while looking up the record.
    {
        let http = FakeHttp::new(Arc::clone(&server), base.clone());
        let config = VerifierConfig::for_testing(base.clone());
        let verifiers = VerifierList::from_keys([note_verifier.clone()]);
        let cache: Arc<dyn PersistentCache> = Arc::new(FsCache::new(dir.path()).unwrap());
        let verifier = Verifier::new(config, http, verifiers, Some(cache));
        verifier.refresh_latest().unwrap();
        let outcome = verifier.lookup("cached.example", "v1.0.0").unwrap();
        assert!(matches!(outcome, LookupOutcome::Verified(_)));
    }

    // Second verifier, fresh process state but the same cache directory,
    // with tile fetches hard-denied: it must still be able to look up the
    // same record purely from the cache, proving the cache was actually
    // written and is actually consulted before the transport.
    let mut http = FakeHttp::new(Arc::clone(&server), base.clone());
    http.deny_tiles = true;
    let config = VerifierConfig::for_testing(base);
    let verifiers = VerifierList::from_keys([note_verifier]);
    let cache: Arc<dyn PersistentCache> = Arc::new(FsCache::new(dir.path()).unwrap());
    let verifier = Verifier::new(config, http, verifiers, Some(cache));

    // `/latest` and `/lookup` still go over the transport; only tile
    // fetches are denied. The cached latest head is also available, but
    // refresh_latest here exercises the still-live non-tile endpoints.
    verifier.refresh_latest().unwrap();
    let outcome = verifier.lookup("cached.example", "v1.0.0").unwrap();
    assert!(
        matches!(outcome, LookupOutcome::Verified(_)),
        "a cache hit must let lookup succeed even though every tile fetch is denied"
    );
}

#[test]
fn a_cold_cache_with_a_denied_transport_fails_closed() {
    let (server, note_verifier) = Server::new(2);
    let server = Arc::new(server);
    server.append("uncached.example", "v1.0.0");

    let dir = tempfile::tempdir().unwrap();
    let base = "https://example.com/notary".to_string();
    let mut http = FakeHttp::new(Arc::clone(&server), base.clone());
    http.deny_tiles = true;
    let config = VerifierConfig::for_testing(base);
    let verifiers = VerifierList::from_keys([note_verifier]);
    let cache: Arc<dyn PersistentCache> = Arc::new(FsCache::new(dir.path()).unwrap());
    let verifier = Verifier::new(config, http, verifiers, Some(cache));

    verifier.refresh_latest().unwrap();
    let err = verifier.lookup("uncached.example", "v1.0.0").unwrap_err();
    // The denied tile fetch surfaces through `HttpTileFetcher::fetch_tile`,
    // which wraps transport errors as `MerkleError::ReaderError` (tile
    // fetching is itself transport-agnostic from the merkle crate's point
    // of view), not as `VerifierError::Http` directly.
    assert!(matches!(err, notary_verifier::VerifierError::Merkle(_)));
}
