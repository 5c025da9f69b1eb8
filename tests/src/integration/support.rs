//! Shared test doubles: an in-memory "server" (log storage + signer) and
//! an `HttpFetcher` that routes requests to it by URL shape, standing in
//! for a real notary server over HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use notary_hash::Hash;
use notary_merkle::reader::MemoryHashReader;
use notary_merkle::{stored_hash_index, tile::new_tiles, tree_hash, Tile};
use notary_note::key::{generate_key, Signer, Verifier as NoteVerifier};
use notary_note::sign::sign;
use notary_note::tree_head::{format_tree, Tree};
use notary_verifier::{HttpError, HttpFetcher};

/// An in-memory notary server: an append-only log plus a signer, exposing
/// the same three endpoints a real server would. Test-only: all state
/// lives in memory, and "hashes" are synthetic strings rather than real
/// module content hashes, since only their byte-for-byte round trip
/// through the log and the manifest comparison matters here.
pub struct Server {
    pub store: StdMutex<MemoryHashReader>,
    pub records: StdMutex<Vec<Record>>,
    pub signer: Signer,
    pub height: u8,
    pub tile_fetches: AtomicUsize,
}

#[derive(Clone)]
pub struct Record {
    pub module: String,
    pub version: String,
    pub line: String,
}

impl Server {
    pub fn new(height: u8) -> (Self, NoteVerifier) {
        let (signer_text, verifier_text) = generate_key("example.com/notary");
        let signer = Signer::parse(&signer_text).unwrap();
        let verifier = NoteVerifier::parse(&verifier_text).unwrap();
        (
            Self {
                store: StdMutex::new(MemoryHashReader::new()),
                records: StdMutex::new(Vec::new()),
                signer,
                height,
                tile_fetches: AtomicUsize::new(0),
            },
            verifier,
        )
    }

    /// Append a record whose manifest hash is derived from the leaf index,
    /// so each leaf carries a distinguishable, deterministic hash value.
    /// The stored leaf body is the canonical `go notary sum` record
    /// (spec.md §3), matching what a real server writes to its log.
    pub fn append(&self, module: &str, version: &str) -> u64 {
        let n = {
            let store = self.store.lock().unwrap();
            store.num_leaves()
        };
        let hash = format!("{:0>43}", format!("leaf{n}="));
        let gomod_hash = format!("{:0>41}gm", format!("leaf{n}="));
        let line = format!(
            "go notary sum\n{module} {version}\nh1:{hash}\n/go.mod h1:{gomod_hash}\n"
        );
        let index = self.store.lock().unwrap().append(line.as_bytes()).unwrap();
        self.records.lock().unwrap().push(Record {
            module: module.to_string(),
            version: version.to_string(),
            line,
        });
        index
    }

    pub fn num_leaves(&self) -> u64 {
        self.store.lock().unwrap().num_leaves()
    }

    pub fn root_hash(&self, n: u64) -> Hash {
        let store = self.store.lock().unwrap();
        if n == 0 {
            [0u8; 32]
        } else {
            tree_hash(n, &*store).unwrap()
        }
    }

    pub fn signed_latest(&self) -> Vec<u8> {
        let n = self.num_leaves();
        let tree = Tree { n, hash: self.root_hash(n) };
        sign(&format_tree(&tree), &[], &[&self.signer]).unwrap()
    }

    pub fn lookup_body(&self, module: &str, version: &str) -> Vec<u8> {
        let records = self.records.lock().unwrap();
        let (index, record) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.module == module && r.version == version)
            .map(|(i, r)| (i as u64, r.clone()))
            .expect("record exists in this fake server");
        let mut out = format!("{index}\n{}\n", record.line).into_bytes();
        out.extend_from_slice(&self.signed_latest());
        out
    }

    pub fn tile_bytes(&self, tile: &Tile) -> Vec<u8> {
        self.tile_fetches.fetch_add(1, Ordering::SeqCst);
        let store = self.store.lock().unwrap();
        let row_start = tile.n << tile.h;
        let level_start = tile.l * tile.h;
        let mut data = Vec::new();
        for pos in row_start..row_start + tile.w as u64 {
            let idx = stored_hash_index(level_start, pos);
            data.extend_from_slice(&store.raw_hashes()[idx as usize]);
        }
        data
    }

    /// Every tile a client configured at `height` would need to fetch to
    /// read every stored hash after this server's current leaf count.
    pub fn all_tiles(&self) -> Vec<Tile> {
        new_tiles(self.height, 0, self.num_leaves())
    }
}

/// Routes `get_url` calls to a [`Server`] by URL shape. `deny_tiles`, when
/// set, makes every `/tile/...` request fail — used to prove a cache hit
/// never reaches the transport.
pub struct FakeHttp {
    pub server: std::sync::Arc<Server>,
    pub base: String,
    pub deny_tiles: bool,
    pub calls: AtomicUsize,
}

impl FakeHttp {
    pub fn new(server: std::sync::Arc<Server>, base: impl Into<String>) -> Self {
        Self {
            server,
            base: base.into(),
            deny_tiles: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl HttpFetcher for FakeHttp {
    fn get_url(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = url.strip_prefix(&self.base).unwrap_or(url).trim_start_matches('/');
        if path == "latest" {
            return Ok(self.server.signed_latest());
        }
        if let Some(rest) = path.strip_prefix("lookup/") {
            let (module, version) = rest
                .split_once('@')
                .ok_or_else(|| HttpError::Status { url: url.to_string(), status: 400 })?;
            return Ok(self.server.lookup_body(module, version));
        }
        if let Some(rest) = path.strip_prefix("tile/") {
            if self.deny_tiles {
                return Err(HttpError::Transport {
                    url: url.to_string(),
                    detail: "simulated offline tile transport".into(),
                });
            }
            let tile = Tile::parse_path(&format!("tile/{rest}"))
                .map_err(|e| HttpError::BodyShape { url: url.to_string(), detail: e.to_string() })?;
            return Ok(self.server.tile_bytes(&tile));
        }
        Err(HttpError::Status { url: url.to_string(), status: 404 })
    }
}
