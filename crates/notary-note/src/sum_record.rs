//! # Sum-record codec
//!
//! Parses and formats the manifest record stored at each log leaf: a
//! module path, version, and one hash per algorithm for the module
//! content and its `go.mod` file. Spec.md §3, §4.5.6.

use crate::errors::NoteError;

const HEADER: &str = "go notary sum";
const MAX_LEN: usize = 10_000;

/// One `h<n>:<base64>` hash, either for the module tree or for `go.mod`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SumHash {
    /// Algorithm number (the `n` in `h<n>`).
    pub algo: u32,
    /// Base64-encoded hash value, opaque to this crate.
    pub value: String,
}

impl SumHash {
    fn format_main(&self) -> String {
        format!("h{}:{}", self.algo, self.value)
    }

    fn format_gomod(&self) -> String {
        format!("/go.mod h{}:{}", self.algo, self.value)
    }
}

/// A parsed sum record: a module path and version, paired with one hash
/// per algorithm for the module tree and for `go.mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoSum {
    pub path: String,
    pub version: String,
    pub hashes: Vec<SumHash>,
    pub gomod_hashes: Vec<SumHash>,
}

fn parse_hash_line(line: &str) -> Result<(bool, SumHash), NoteError> {
    let (is_gomod, field) = match line.strip_prefix("/go.mod ") {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let (algo_str, value) = field
        .strip_prefix('h')
        .and_then(|s| s.split_once(':'))
        .ok_or_else(|| NoteError::Malformed(format!("malformed hash line: {line:?}")))?;
    let algo: u32 = algo_str
        .parse()
        .map_err(|_| NoteError::Malformed(format!("malformed hash algorithm in: {line:?}")))?;
    if value.is_empty() {
        return Err(NoteError::Malformed(format!("empty hash value in: {line:?}")));
    }
    Ok((is_gomod, SumHash { algo, value: value.to_string() }))
}

/// Validate the version field: must begin with `v`, a digit must follow,
/// and it must contain at least two dots (e.g. `v1.2.3`).
fn validate_version(version: &str) -> Result<(), NoteError> {
    let mut chars = version.chars();
    if chars.next() != Some('v') {
        return Err(NoteError::Malformed(format!("version {version:?} must start with v")));
    }
    if !chars.next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(NoteError::Malformed(format!(
            "version {version:?} must have a digit after v"
        )));
    }
    if version.bytes().filter(|&b| b == b'.').count() < 2 {
        return Err(NoteError::Malformed(format!(
            "version {version:?} must contain at least two dots"
        )));
    }
    Ok(())
}

/// Parse a sum record body. Spec.md §4.5.6.
pub fn parse_gosum(data: &[u8]) -> Result<GoSum, NoteError> {
    if data.len() > MAX_LEN {
        return Err(NoteError::Malformed(format!(
            "sum record is {} bytes, max is {MAX_LEN}",
            data.len()
        )));
    }
    let s = std::str::from_utf8(data)
        .map_err(|_| NoteError::Malformed("sum record is not valid UTF-8".into()))?;
    if s.bytes().filter(|&b| b == b'\n').count() != 4 {
        return Err(NoteError::Malformed(
            "sum record must have exactly four newlines".into(),
        ));
    }
    if !s.ends_with('\n') {
        return Err(NoteError::Malformed("sum record must end with a newline".into()));
    }
    let mut lines = s[..s.len() - 1].split('\n');

    let header = lines.next().unwrap_or_default();
    if header != HEADER {
        return Err(NoteError::Malformed(format!(
            "sum record missing {HEADER:?} header"
        )));
    }

    let id_line = lines
        .next()
        .ok_or_else(|| NoteError::Malformed("sum record missing module/version line".into()))?;
    let (path, version) = id_line
        .split_once(' ')
        .ok_or_else(|| NoteError::Malformed(format!("malformed module/version line: {id_line:?}")))?;
    if path.is_empty() {
        return Err(NoteError::Malformed("sum record has empty module path".into()));
    }
    validate_version(version)?;

    let mut hashes = Vec::new();
    let mut gomod_hashes = Vec::new();
    for line in lines {
        let (is_gomod, hash) = parse_hash_line(line)?;
        if is_gomod {
            gomod_hashes.push(hash);
        } else {
            hashes.push(hash);
        }
    }

    check_bijection(&hashes, &gomod_hashes)?;

    hashes.sort();
    gomod_hashes.sort();

    Ok(GoSum {
        path: path.to_string(),
        version: version.to_string(),
        hashes,
        gomod_hashes,
    })
}

/// Require the set of algorithm numbers on the main side to exactly match
/// the set on the `go.mod` side, with no duplicates on either side.
fn check_bijection(hashes: &[SumHash], gomod_hashes: &[SumHash]) -> Result<(), NoteError> {
    let mut main_algos: Vec<u32> = hashes.iter().map(|h| h.algo).collect();
    let mut gomod_algos: Vec<u32> = gomod_hashes.iter().map(|h| h.algo).collect();
    main_algos.sort_unstable();
    gomod_algos.sort_unstable();
    if main_algos.windows(2).any(|w| w[0] == w[1]) {
        return Err(NoteError::Malformed("duplicate algorithm prefix in module hashes".into()));
    }
    if gomod_algos.windows(2).any(|w| w[0] == w[1]) {
        return Err(NoteError::Malformed("duplicate algorithm prefix in go.mod hashes".into()));
    }
    if main_algos != gomod_algos {
        return Err(NoteError::Malformed(
            "hash algorithm prefixes are not paired between module and go.mod hashes".into(),
        ));
    }
    if main_algos.is_empty() {
        return Err(NoteError::Malformed("sum record has no hashes".into()));
    }
    Ok(())
}

/// Render a sum record's hashes as `go.sum`-style manifest lines:
/// `<path> <version> h<n>:<value>` for each module hash, followed by
/// `<path> <version>/go.mod h<n>:<value>` for each `go.mod` hash. Used by
/// the Verifier to answer `Lookup` with the lines spec.md §4.6 describes.
pub fn manifest_lines(sum: &GoSum) -> Vec<String> {
    let mut lines = Vec::with_capacity(sum.hashes.len() + sum.gomod_hashes.len());
    for h in &sum.hashes {
        lines.push(format!("{} {} h{}:{}", sum.path, sum.version, h.algo, h.value));
    }
    for h in &sum.gomod_hashes {
        lines.push(format!("{} {}/go.mod h{}:{}", sum.path, sum.version, h.algo, h.value));
    }
    lines
}

/// Format a sum record body. Inverse of [`parse_gosum`] up to hash order
/// (hashes are emitted in the order the caller supplied; use
/// [`parse_gosum`]'s sorted output to obtain a canonical record).
pub fn format_gosum(sum: &GoSum) -> String {
    let mut out = format!("{HEADER}\n{} {}\n", sum.path, sum.version);
    for h in &sum.hashes {
        out.push_str(&h.format_main());
        out.push('\n');
    }
    for h in &sum.gomod_hashes {
        out.push_str(&h.format_gomod());
        out.push('\n');
    }
    out
}
