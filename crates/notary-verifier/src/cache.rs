//! # Persistent cache adapter
//!
//! A `Verifier` keeps its monotonic tree head and tile cache in memory for
//! the life of the process, but a command-line tool like `notecheck` runs
//! once per invocation: without a persistent cache it can never detect a
//! rollback between runs, only within one. [`PersistentCache`] is the
//! outbound port for that; [`FsCache`] is a plain-files adapter, one file
//! per tile (named after the tile's own path) plus one `latest` file
//! holding the last signed tree head seen.
//!
//! Writes go through a temp-file-then-rename so a crash mid-write can
//! never leave a half-written file behind to be read back as valid.

use std::path::{Path, PathBuf};

use notary_merkle::Tile;

/// Outbound port for persisting verifier state across process runs.
pub trait PersistentCache: Send + Sync {
    /// The last signed tree-head note this cache has recorded, if any.
    fn load_latest(&self) -> Option<Vec<u8>>;

    /// Record a new signed tree-head note, replacing any previous one.
    fn save_latest(&self, signed_note: &[u8]);

    /// A previously cached tile body, if this cache has one.
    fn load_tile(&self, tile: &Tile) -> Option<Vec<u8>>;

    /// Cache a tile body for later reuse.
    fn save_tile(&self, tile: &Tile, data: &[u8]);
}

/// Filesystem-backed [`PersistentCache`]: tiles live under `<root>/` at
/// their own relative path (`tile.path()` already starts with `tile/`),
/// the signed head lives at `<root>/latest`.
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    /// Use (creating if needed) `root` as the cache directory.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn latest_path(&self) -> PathBuf {
        self.root.join("latest")
    }

    fn tile_path(&self, tile: &Tile) -> PathBuf {
        self.root.join(tile.path())
    }

    fn write_atomic(path: &Path, data: &[u8]) {
        let Some(parent) = path.parent() else { return };
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
        let tmp = path.with_extension("tmp");
        if std::fs::write(&tmp, data).is_err() {
            return;
        }
        if std::fs::rename(&tmp, path).is_err() {
            tracing::warn!(path = %path.display(), "failed to commit cache write");
        }
    }
}

impl PersistentCache for FsCache {
    fn load_latest(&self) -> Option<Vec<u8>> {
        std::fs::read(self.latest_path()).ok()
    }

    fn save_latest(&self, signed_note: &[u8]) {
        Self::write_atomic(&self.latest_path(), signed_note);
    }

    fn load_tile(&self, tile: &Tile) -> Option<Vec<u8>> {
        std::fs::read(self.tile_path(tile)).ok()
    }

    fn save_tile(&self, tile: &Tile, data: &[u8]) {
        Self::write_atomic(&self.tile_path(tile), data);
    }
}

/// No-op cache for callers that want a fresh start every run (matches the
/// teacher's in-memory-only `Default` adapters used in unit tests).
#[derive(Default)]
pub struct NullCache;

impl PersistentCache for NullCache {
    fn load_latest(&self) -> Option<Vec<u8>> {
        None
    }
    fn save_latest(&self, _signed_note: &[u8]) {}
    fn load_tile(&self, _tile: &Tile) -> Option<Vec<u8>> {
        None
    }
    fn save_tile(&self, _tile: &Tile, _data: &[u8]) {}
}
