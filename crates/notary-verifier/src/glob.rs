//! # GONOVERIFY pattern matching
//!
//! `GONOVERIFY` (spec.md §6) holds a comma-separated list of glob patterns
//! matched against a module path using the same `*`/`?` semantics as Go's
//! `path.Match`: `*` matches any sequence of non-`/` bytes, `?` matches
//! exactly one non-`/` byte, everything else matches literally. There is no
//! `[...]` character-class support here because no pattern in the wild
//! (and no spec.md example) uses one; adding it would be unused generality.

/// Returns true if `pattern` matches `path` under `*`/`?` glob semantics,
/// with `/` excluded from both wildcards' matches.
pub fn matches(pattern: &str, path: &str) -> bool {
    match_bytes(pattern.as_bytes(), path.as_bytes())
}

/// Returns true if any pattern in `patterns` matches `path`.
pub fn matches_any(patterns: &[String], path: &str) -> bool {
    patterns.iter().any(|p| matches(p, path))
}

fn match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match_from(pattern, text)
}

/// Backtracking matcher: on a `*`, try consuming zero bytes first, then
/// fall back to consuming one more non-`/` byte at a time.
fn match_from(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let (mut star_p, mut star_t) = (None, 0usize);

    loop {
        if p < pattern.len() {
            let pc = pattern[p];
            if pc == b'*' {
                star_p = Some(p);
                star_t = t;
                p += 1;
                continue;
            }
            if t < text.len() && text[t] != b'/' && (pc == b'?' || pc == text[t]) {
                p += 1;
                t += 1;
                continue;
            }
        } else if t == text.len() {
            return true;
        }

        // Mismatch (or pattern exhausted but text remains): backtrack to
        // the most recent `*`, if any, and let it eat one more byte.
        if let Some(sp) = star_p {
            if text.get(star_t).copied() == Some(b'/') {
                return false;
            }
            star_t += 1;
            p = sp + 1;
            t = star_t;
            if t > text.len() {
                return false;
            }
            continue;
        }
        return false;
    }
}
