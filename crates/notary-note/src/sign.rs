//! # Note signing (`Sign`)
//!
//! Spec.md §4.5.4.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::errors::NoteError;
use crate::key::Signer;
use crate::parse::Signature;

fn format_signature_line(name: &str, fingerprint: u32, sig: &[u8]) -> String {
    let mut body = Vec::with_capacity(4 + sig.len());
    body.extend_from_slice(&fingerprint.to_be_bytes());
    body.extend_from_slice(sig);
    format!("\u{2014} {name} {}\n", B64.encode(body))
}

/// Produce signed-note bytes for `text`, carrying forward `existing`
/// signatures not superseded by `signers`, plus one fresh signature per
/// signer.
///
/// Existing signatures are deduplicated by `(name, fingerprint)`; any
/// with the same identity as one of `signers` are dropped in favor of the
/// freshly computed signature.
pub fn sign(text: &str, existing: &[Signature], signers: &[&Signer]) -> Result<Vec<u8>, NoteError> {
    if text.is_empty() || !text.ends_with('\n') {
        return Err(NoteError::Malformed("note text must end with a newline".into()));
    }

    let new_identities: HashSet<(&str, u32)> = signers.iter().map(|s| (s.name(), s.fingerprint())).collect();

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for sig in existing {
        let identity = (sig.name.as_str(), sig.fingerprint);
        if new_identities.contains(&identity) {
            continue;
        }
        if !seen.insert(identity) {
            continue;
        }
        lines.push(format_signature_line(&sig.name, sig.fingerprint, &sig.signature));
    }

    for signer in signers {
        let mut msg = Vec::with_capacity(text.len() + 1 + signer.name().len());
        msg.extend_from_slice(text.as_bytes());
        msg.push(b'\n');
        msg.extend_from_slice(signer.name().as_bytes());
        let sig = signer.sign(&msg);
        lines.push(format_signature_line(signer.name(), signer.fingerprint(), &sig));
    }

    let mut out = String::with_capacity(text.len() + 1 + lines.iter().map(|l| l.len()).sum::<usize>());
    out.push_str(text);
    out.push('\n');
    for line in lines {
        out.push_str(&line);
    }
    Ok(out.into_bytes())
}
