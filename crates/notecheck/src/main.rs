//! `notecheck` — an auditing CLI that verifies module-checksum manifests
//! against a notarylog server. Spec.md §6.
//!
//! ```text
//! notecheck [-h H] [-k key] [-u url] [-v] <manifest>...
//! ```

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use notary_note::key::Verifier as NoteVerifier;
use notary_note::sumlines::{parse_manifest, ManifestLine};
use notary_note::VerifierList;
use notary_verifier::{HttpClient, LookupOutcome, Verifier, VerifierConfig};

/// Verify module-checksum manifests against a notarylog server.
#[derive(Parser, Debug)]
#[command(name = "notecheck", about = "Audit go.sum-style manifests against a notarylog server")]
struct Args {
    /// Tile height used by the server's tile layout.
    #[arg(short = 'h', long = "height", default_value_t = 8)]
    height: u8,

    /// A verifier key trusted to sign tree heads. May be repeated.
    #[arg(short = 'k', long = "key")]
    keys: Vec<String>,

    /// Base URL of the notary server. Defaults to `https://<key-name>`.
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Log per-request timing to stderr.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Manifest files to check.
    #[arg(required = true)]
    manifests: Vec<String>,
}

fn expected_line(entry: &ManifestLine) -> String {
    if entry.go_mod {
        format!("{} {}/go.mod h1:{}", entry.module, entry.version, entry.hash)
    } else {
        format!("{} {} h1:{}", entry.module, entry.version, entry.hash)
    }
}

fn timed<T>(verbose: bool, label: &str, f: impl FnOnce() -> T) -> T {
    if !verbose {
        return f();
    }
    let start = Instant::now();
    let result = f();
    eprintln!("{label}: {:?}", start.elapsed());
    result
}

fn run() -> Result<()> {
    let args = Args::parse();

    if args.keys.is_empty() {
        bail!("at least one -k verifier key is required");
    }
    let mut verifiers = Vec::new();
    for key in &args.keys {
        let v = NoteVerifier::parse(key).with_context(|| format!("parsing verifier key {key:?}"))?;
        verifiers.push(v);
    }
    let base_url = args
        .url
        .clone()
        .unwrap_or_else(|| format!("https://{}", verifiers[0].name()));

    let config = VerifierConfig::new(base_url, args.height);
    let http = HttpClient::new();
    let verifier_list = VerifierList::from_keys(verifiers);
    let verifier = Verifier::new(config, http, verifier_list, None);

    timed(args.verbose, "GET /latest", || verifier.refresh_latest())
        .context("fetching the server's latest tree head")?;

    let mut had_internal_error = false;
    for path in &args.manifests {
        let data = std::fs::read(path).with_context(|| format!("reading manifest {path}"))?;
        let entries = parse_manifest(&data).with_context(|| format!("parsing manifest {path}"))?;

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            let key = (entry.module.clone(), entry.version.clone());
            if !seen.insert(key) {
                continue;
            }

            let label = format!("GET /lookup/{}@{}", entry.module, entry.version);
            let outcome = timed(args.verbose, &label, || verifier.lookup(&entry.module, &entry.version));

            match outcome {
                Ok(LookupOutcome::Skipped) => {
                    eprintln!("{} {}: skipped (GONOVERIFY)", entry.module, entry.version);
                }
                Ok(LookupOutcome::Verified(lines)) => {
                    let wanted: Vec<&ManifestLine> = entries
                        .iter()
                        .filter(|e| e.module == entry.module && e.version == entry.version)
                        .collect();
                    let mismatched = wanted
                        .iter()
                        .any(|e| !lines.contains(&expected_line(e)));
                    if mismatched {
                        // A per-record checksum mismatch is reported but does
                        // not fail the run: spec.md §6 reserves a non-zero
                        // exit code for internal errors and detected forks.
                        println!(
                            "{} {}: CHECKSUM MISMATCH (server does not confirm the manifest's hash)",
                            entry.module, entry.version
                        );
                    } else {
                        println!("{} {}: verified", entry.module, entry.version);
                    }
                }
                Err(e) => {
                    // Unlike a checksum mismatch, a lookup error (transport
                    // failure, tile mismatch, malformed server response) is
                    // an internal error per spec.md §6's exit-code contract.
                    had_internal_error = true;
                    eprintln!("{} {}: {e}", entry.module, entry.version);
                }
            }
        }
    }

    if had_internal_error {
        bail!("one or more lookups failed; see stderr for details");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    run()
}
