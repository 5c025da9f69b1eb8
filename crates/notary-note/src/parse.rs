//! # Note parsing (`Open`)
//!
//! Strict parser for the signed-note wire format. Spec.md §3, §4.5.3.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::errors::NoteError;
use crate::registry::VerifierList;

const EM_DASH_PREFIX: &str = "\u{2014} ";
const MAX_SIGNATURE_LINES: usize = 100;

/// One signature line: `(name, fingerprint, raw signature bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub fingerprint: u32,
    pub signature: Vec<u8>,
}

/// A parsed signed note: its text, and the signatures that verified
/// against a registered key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub text: String,
    pub sigs: Vec<Signature>,
    pub unverified: Vec<Signature>,
}

/// [`open`] failed, but — unless the failure was at the wire-format
/// level — a parsed note is still attached for inspection.
#[derive(Debug)]
pub struct OpenError {
    pub error: NoteError,
    pub note: Option<Note>,
}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for OpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

fn fail(error: NoteError) -> OpenError {
    OpenError { error, note: None }
}

/// Parse and verify a signed note. Spec.md §4.5.3.
pub fn open(data: &[u8], verifiers: &VerifierList) -> Result<Note, OpenError> {
    let s = std::str::from_utf8(data)
        .map_err(|_| fail(NoteError::Malformed("note is not valid UTF-8".into())))?;
    if s.bytes().any(|b| b < 0x20 && b != b'\n') {
        return Err(fail(NoteError::Malformed(
            "note contains a control byte other than newline".into(),
        )));
    }

    let split_at = s
        .rfind("\n\n")
        .ok_or_else(|| fail(NoteError::Malformed("no blank line separating text from signatures".into())))?;
    let text = &s[..split_at + 1];
    let sig_block = &s[split_at + 2..];

    if text.is_empty() || !text.ends_with('\n') {
        return Err(fail(NoteError::Malformed("note text must end with a newline".into())));
    }
    if sig_block.is_empty() || !sig_block.ends_with('\n') {
        return Err(fail(NoteError::Malformed(
            "signature block must be non-empty and end with a newline".into(),
        )));
    }

    let lines: Vec<&str> = sig_block[..sig_block.len() - 1].split('\n').collect();
    if lines.len() > MAX_SIGNATURE_LINES {
        return Err(fail(NoteError::Malformed(format!(
            "signature block has {} lines, max is {MAX_SIGNATURE_LINES}",
            lines.len()
        ))));
    }

    let mut sigs = Vec::new();
    let mut unverified = Vec::new();

    for line in lines {
        let rest = line
            .strip_prefix(EM_DASH_PREFIX)
            .ok_or_else(|| fail(NoteError::Malformed(format!("malformed signature line: {line:?}"))))?;
        let (name, b64_field) = rest
            .split_once(' ')
            .ok_or_else(|| fail(NoteError::Malformed(format!("malformed signature line: {line:?}"))))?;
        if name.is_empty() || name.contains(' ') {
            return Err(fail(NoteError::Malformed(format!("malformed signer name: {name:?}"))));
        }
        let decoded = B64
            .decode(b64_field)
            .map_err(|_| fail(NoteError::Malformed("signature field is not valid base64".into())))?;
        if decoded.len() < 5 {
            return Err(fail(NoteError::Malformed(
                "signature field shorter than fingerprint + signature".into(),
            )));
        }
        let (fp_bytes, sig_bytes) = decoded.split_at(4);
        let fingerprint = u32::from_be_bytes(fp_bytes.try_into().expect("split_at(4)"));

        match verifiers.find(name, fingerprint) {
            Ok(verifier) => {
                let mut msg = Vec::with_capacity(text.len() + 1 + name.len());
                msg.extend_from_slice(text.as_bytes());
                msg.push(b'\n');
                msg.extend_from_slice(name.as_bytes());
                if verifier.verify(&msg, sig_bytes) {
                    sigs.push(Signature {
                        name: name.to_string(),
                        fingerprint,
                        signature: sig_bytes.to_vec(),
                    });
                } else {
                    return Err(fail(NoteError::InvalidSignature {
                        name: name.to_string(),
                        fingerprint,
                    }));
                }
            }
            Err(NoteError::UnknownKey { .. }) => {
                unverified.push(Signature {
                    name: name.to_string(),
                    fingerprint,
                    signature: sig_bytes.to_vec(),
                });
            }
            Err(other) => return Err(fail(other)),
        }
    }

    let note = Note {
        text: text.to_string(),
        sigs,
        unverified,
    };

    if note.sigs.is_empty() {
        Err(OpenError {
            error: NoteError::NoVerifiedSignatures,
            note: Some(note),
        })
    } else {
        Ok(note)
    }
}
