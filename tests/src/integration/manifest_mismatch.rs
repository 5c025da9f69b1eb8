//! Mirrors the comparison the `notecheck` binary performs: a manifest's
//! declared hash for a module is checked against the lines the verifier
//! returns from a cross-checked log lookup. Spec.md Scenario F.

use std::sync::Arc;

use notary_note::sumlines::parse_manifest;
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

fn expected_line(module: &str, version: &str, go_mod: bool, hash: &str) -> String {
    if go_mod {
        format!("{module} {version}/go.mod h1:{hash}")
    } else {
        format!("{module} {version} h1:{hash}")
    }
}

#[test]
fn a_manifest_matching_the_log_passes() {
    let (server, verifier) = build(2);
    server.append("foo.example", "v1.2.3");
    verifier.refresh_latest().unwrap();

    let LookupOutcome::Verified(lines) = verifier.lookup("foo.example", "v1.2.3").unwrap() else {
        panic!("expected a verified outcome");
    };

    // Build a manifest from the log's own returned lines: it must parse
    // and every entry must be present verbatim among the returned lines.
    let manifest_text = lines.join("\n") + "\n";
    let entries = parse_manifest(manifest_text.as_bytes()).unwrap();
    for entry in &entries {
        let want = expected_line(&entry.module, &entry.version, entry.go_mod, &entry.hash);
        assert!(lines.contains(&want));
    }
}

#[test]
fn a_manifest_with_a_tampered_hash_is_flagged_as_a_mismatch() {
    let (server, verifier) = build(2);
    server.append("foo.example", "v1.2.3");
    verifier.refresh_latest().unwrap();

    let LookupOutcome::Verified(lines) = verifier.lookup("foo.example", "v1.2.3").unwrap() else {
        panic!("expected a verified outcome");
    };

    // Tamper with the manifest's hash for the main module line, leaving
    // the go.mod line untouched, simulating a corrupted go.sum entry.
    let tampered_manifest = "foo.example v1.2.3 h1:not-the-real-hash-at-all=\n".to_string()
        + &lines[1]
        + "\n";
    let entries = parse_manifest(tampered_manifest.as_bytes()).unwrap();

    let main_entry = entries.iter().find(|e| !e.go_mod).unwrap();
    let want = expected_line(&main_entry.module, &main_entry.version, main_entry.go_mod, &main_entry.hash);
    assert!(
        !lines.contains(&want),
        "a tampered manifest hash must not match any line the log actually returned"
    );
}

#[test]
fn a_record_whose_stored_leaf_was_tampered_fails_the_cross_check() {
    // This exercises the other half of Scenario F: not a manifest/log
    // mismatch, but the log's own stored leaf hash disagreeing with the
    // record bytes the server handed back for that leaf.
    use notary_verifier::HttpError;

    struct TamperingHttp {
        inner: FakeHttp,
    }

    impl notary_verifier::HttpFetcher for TamperingHttp {
        fn get_url(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            let body = self.inner.get_url(url)?;
            if url.contains("lookup/") {
                // Flip a byte inside the record body (after the leaf-index
                // line), leaving the signed head at the end untouched.
                let mut body = body;
                if let Some(newline) = body.iter().position(|&b| b == b'\n') {
                    if body.len() > newline + 5 {
                        body[newline + 5] ^= 0x01;
                    }
                }
                return Ok(body);
            }
            Ok(body)
        }
    }

    let (server, note_verifier) = Server::new(2);
    let server = Arc::new(server);
    server.append("bar.example", "v0.1.0");
    let base = "https://example.com/notary".to_string();
    let http = TamperingHttp { inner: FakeHttp::new(Arc::clone(&server), base.clone()) };
    let config = VerifierConfig::for_testing(base);
    let verifiers = VerifierList::from_keys([note_verifier]);
    let verifier = Verifier::new(config, http, verifiers, None);

    verifier.refresh_latest().unwrap();
    let err = verifier.lookup("bar.example", "v0.1.0").unwrap_err();
    assert!(matches!(err, notary_verifier::VerifierError::TileMismatch(_)));
}
