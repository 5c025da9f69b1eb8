//! # Manifest line extraction
//!
//! A small utility that pulls `<module> <version> h1:<hash>` lines out of
//! a `go.sum`-style manifest, used by the `notecheck` CLI and its tests.
//! Spec.md §1 treats the manifest/module-download pipeline as an external
//! collaborator; this extractor is the narrow piece the Verifier actually
//! needs to drive lookups against its own sum records.

use crate::errors::NoteError;

/// One manifest line: a module path, version, and its declared hash.
/// `go.mod` lines (suffix `/go.mod`) are represented with `go_mod = true`
/// and an empty `module` suffix already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    pub module: String,
    pub version: String,
    pub go_mod: bool,
    pub hash: String,
}

/// Parse every non-blank line of a manifest. Spec.md §6 file formats.
///
/// Each line must be `<module> <version> h1:<hash>` or
/// `<module> <version>/go.mod h1:<hash>`; blank lines are skipped.
pub fn parse_manifest(data: &[u8]) -> Result<Vec<ManifestLine>, NoteError> {
    let s = std::str::from_utf8(data)
        .map_err(|_| NoteError::Malformed("manifest is not valid UTF-8".into()))?;
    let mut out = Vec::new();
    for line in s.lines() {
        if line.trim().is_empty() {
            continue;
        }
        out.push(parse_manifest_line(line)?);
    }
    Ok(out)
}

fn parse_manifest_line(line: &str) -> Result<ManifestLine, NoteError> {
    let mut fields = line.split_whitespace();
    let module = fields
        .next()
        .ok_or_else(|| NoteError::Malformed(format!("empty manifest line: {line:?}")))?;
    let version_field = fields
        .next()
        .ok_or_else(|| NoteError::Malformed(format!("manifest line missing version: {line:?}")))?;
    let hash_field = fields
        .next()
        .ok_or_else(|| NoteError::Malformed(format!("manifest line missing hash: {line:?}")))?;
    if fields.next().is_some() {
        return Err(NoteError::Malformed(format!(
            "manifest line has extra fields: {line:?}"
        )));
    }

    let (version, go_mod) = match version_field.strip_suffix("/go.mod") {
        Some(v) => (v, true),
        None => (version_field, false),
    };

    let hash = hash_field
        .strip_prefix("h1:")
        .ok_or_else(|| NoteError::Malformed(format!("manifest line hash must be h1:...: {line:?}")))?;
    if hash.is_empty() {
        return Err(NoteError::Malformed(format!("empty hash in manifest line: {line:?}")));
    }

    Ok(ManifestLine {
        module: module.to_string(),
        version: version.to_string(),
        go_mod,
        hash: hash.to_string(),
    })
}
