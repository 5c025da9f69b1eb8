use std::sync::Arc;

use notary_note::VerifierList;
use notary_verifier::{LookupOutcome, Verifier, VerifierConfig};

use super::support::{FakeHttp, Server};

fn build(height: u8) -> (Arc<Server>, Verifier<FakeHttp>) {
    let (server, note_verifier) = Server::new(height);
    let server = Arc::new(server);
    let base = "https://example.com/notary".to_string();
    let http = FakeHttp::new(Arc::clone(&server), base.clone());
    let mut config = VerifierConfig::for_testing(base);
    config.tile_height = height;
    let verifiers = VerifierList::from_keys([note_verifier]);
    (server.clone(), Verifier::new(config, http, verifiers, None))
}

#[test]
fn full_server_to_client_round_trip_across_many_leaves() {
    let (server, verifier) = build(2);
    let modules = [
        ("rsc.io/quote", "v1.5.2"),
        ("golang.org/x/text", "v0.3.0"),
        ("github.com/pkg/errors", "v0.9.1"),
        ("golang.org/x/tools", "v0.1.0"),
        ("example.com/private/repo", "v2.0.0"),
    ];
    for (module, version) in modules {
        server.append(module, version);
    }

    verifier.refresh_latest().unwrap();
    assert_eq!(verifier.current_tree().unwrap().n, modules.len() as u64);

    for (module, version) in modules {
        let outcome = verifier.lookup(module, version).unwrap();
        match outcome {
            LookupOutcome::Verified(lines) => {
                assert_eq!(lines.len(), 2, "expected a main hash and a go.mod hash line");
                assert!(lines[0].starts_with(&format!("{module} {version} h1:")));
                assert!(lines[1].starts_with(&format!("{module} {version}/go.mod h1:")));
            }
            LookupOutcome::Skipped => panic!("no GONOVERIFY pattern configured"),
        }
    }
}

#[test]
fn appending_after_a_refresh_advances_the_tree_monotonically() {
    let (server, verifier) = build(4);
    server.append("a.example", "v1.0.0");
    let first = verifier.update_latest(&server.signed_latest()).unwrap();
    assert_eq!(first.n, 1);

    for i in 0..10 {
        server.append("batch.example", &format!("v1.{i}.0"));
    }
    let second = verifier.update_latest(&server.signed_latest()).unwrap();
    assert_eq!(second.n, 11);
    assert!(second.n > first.n);

    // The record appended before the refresh is still verifiable against
    // the now-much-larger tree.
    let outcome = verifier.lookup("a.example", "v1.0.0").unwrap();
    assert!(matches!(outcome, LookupOutcome::Verified(_)));
}

#[test]
fn tile_height_one_still_round_trips() {
    // Height 1 is the smallest legal tile height (spec.md §3: 1 <= H <= 30)
    // and exercises the most tile boundaries per leaf.
    let (server, verifier) = build(1);
    for i in 0..9 {
        server.append("tiny.example", &format!("v0.0.{i}"));
    }
    verifier.refresh_latest().unwrap();
    for i in 0..9 {
        let outcome = verifier.lookup("tiny.example", &format!("v0.0.{i}")).unwrap();
        assert!(matches!(outcome, LookupOutcome::Verified(_)));
    }
}
