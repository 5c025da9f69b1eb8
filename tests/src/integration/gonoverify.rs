use std::sync::atomic::Ordering;
use std::sync::Arc;

use notary_note::VerifierList;
use notary_verifier::{LookupOutcome, Verifier, VerifierConfig};

use super::support::{FakeHttp, Server};

#[test]
fn a_skipped_module_never_reaches_the_transport() {
    let (server, note_verifier) = Server::new(2);
    let server = Arc::new(server);
    server.append("example.com/private/secret", "v1.0.0");
    server.append("rsc.io/quote", "v1.5.2");

    let base = "https://example.com/notary".to_string();
    let http = Arc::new(FakeHttp::new(Arc::clone(&server), base.clone()));
    let mut config = VerifierConfig::for_testing(base);
    config.skip_patterns = vec!["example.com/private/*".to_string()];
    let verifiers = VerifierList::from_keys([note_verifier]);
    let verifier = Verifier::new(config, http.clone(), verifiers, None);

    verifier.refresh_latest().unwrap();
    let calls_before = http.calls.load(Ordering::SeqCst);

    let outcome = verifier.lookup("example.com/private/secret", "v1.0.0").unwrap();
    assert_eq!(outcome, LookupOutcome::Skipped);
    assert_eq!(
        http.calls.load(Ordering::SeqCst),
        calls_before,
        "a GONOVERIFY match must short-circuit before any HTTP request"
    );

    // A module that does not match the pattern is still verified normally.
    let outcome = verifier.lookup("rsc.io/quote", "v1.5.2").unwrap();
    assert!(matches!(outcome, LookupOutcome::Verified(_)));
    assert!(http.calls.load(Ordering::SeqCst) > calls_before);
}

#[test]
fn multiple_glob_patterns_are_tried_independently() {
    let (server, note_verifier) = Server::new(2);
    let server = Arc::new(server);
    server.append("a.example/one", "v1.0.0");
    server.append("b.example/two", "v1.0.0");
    server.append("c.example/three", "v1.0.0");

    let base = "https://example.com/notary".to_string();
    let http = FakeHttp::new(Arc::clone(&server), base.clone());
    let mut config = VerifierConfig::for_testing(base);
    config.skip_patterns = vec!["a.example/*".to_string(), "b.example/*".to_string()];
    let verifiers = VerifierList::from_keys([note_verifier]);
    let verifier = Verifier::new(config, http, verifiers, None);
    verifier.refresh_latest().unwrap();

    assert_eq!(verifier.lookup("a.example/one", "v1.0.0").unwrap(), LookupOutcome::Skipped);
    assert_eq!(verifier.lookup("b.example/two", "v1.0.0").unwrap(), LookupOutcome::Skipped);
    assert!(matches!(
        verifier.lookup("c.example/three", "v1.0.0").unwrap(),
        LookupOutcome::Verified(_)
    ));
}
