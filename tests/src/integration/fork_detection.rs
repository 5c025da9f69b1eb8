use std::sync::Arc;

use notary_hash::record_hash;
use notary_note::sign::sign;
use notary_note::tree_head::{format_tree, Tree};
use notary_note::VerifierList;
use notary_verifier::{Verifier, VerifierConfig};

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
#[should_panic(expected = "fork detected")]
fn a_rewritten_history_at_the_same_size_is_a_fork() {
    let (server, verifier) = build(2);
    server.append("a.example", "v1.0.0");
    server.append("b.example", "v1.0.0");
    verifier.update_latest(&server.signed_latest()).unwrap();

    // Same signer, same leaf count, but a different (forged) root hash:
    // an equivocating server signing two incompatible histories of equal
    // size. This is the textbook fork spec.md §8 property 11 describes.
    let forged = Tree { n: 2, hash: record_hash(b"a different history entirely") };
    let forged_note = sign(&format_tree(&forged), &[], &[&server.signer]).unwrap();

    verifier.update_latest(&forged_note).unwrap();
}

#[test]
#[should_panic(expected = "fork detected")]
fn a_rollback_to_a_smaller_inconsistent_tree_is_a_fork() {
    let (server, verifier) = build(2);
    server.append("a.example", "v1.0.0");
    server.append("b.example", "v1.0.0");
    server.append("c.example", "v1.0.0");
    verifier.update_latest(&server.signed_latest()).unwrap();

    // A smaller tree whose root does not match any prefix of the real
    // history the verifier has already committed to.
    let forged = Tree { n: 1, hash: record_hash(b"not the real first leaf") };
    let forged_note = sign(&format_tree(&forged), &[], &[&server.signer]).unwrap();

    verifier.update_latest(&forged_note).unwrap();
}

#[test]
fn a_genuinely_consistent_smaller_head_is_accepted_without_moving_latest() {
    let (server, verifier) = build(2);
    server.append("a.example", "v1.0.0");
    let old_signed = server.signed_latest();
    server.append("b.example", "v1.0.0");
    server.append("c.example", "v1.0.0");
    verifier.update_latest(&server.signed_latest()).unwrap();

    // A real, earlier signed head from the same honest history: this is
    // consistent, not a fork, and must not panic or roll `latest` back.
    let result = verifier.update_latest(&old_signed).unwrap();
    assert_eq!(result.n, 3, "latest must stay at the larger tree size");
    assert_eq!(verifier.current_tree().unwrap().n, 3);
}
