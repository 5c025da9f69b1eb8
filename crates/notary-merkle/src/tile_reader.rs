//! # Tile reader
//!
//! A [`HashReader`] that answers `ReadHashes` by mapping each requested
//! stored index to its tile, fetching tile bytes through a
//! [`TileFetcher`] port, and deriving the hash via
//! [`hash_from_tile`](crate::tile::hash_from_tile). Spec.md §4.4.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use notary_hash::Hash;
use rayon::prelude::*;

use crate::errors::MerkleError;
use crate::reader::HashReader;
use crate::tile::{hash_from_tile, tile_for_index, Tile};

/// Default tile-cache capacity when a reader is built with [`TileReader::new`]
/// rather than [`TileReader::with_capacity`]. Mirrors the teacher's
/// `LightClientService`'s fallback proof-cache size.
const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Outbound port: fetch the raw bytes of one tile. Implementations own the
/// transport (HTTP, filesystem, ...); this crate only consumes the port.
pub trait TileFetcher: Send + Sync {
    fn fetch_tile(&self, tile: &Tile) -> Result<Vec<u8>, MerkleError>;
}

/// Optional persistence hook, called after a batch of tiles is freshly
/// fetched. Not part of the core invariants; an external collaborator may
/// use it to write tiles to disk.
pub trait SaveTiles: Send + Sync {
    fn save_tiles(&self, tiles: &[Tile], data: &[Vec<u8>]);
}

/// Cache-backed [`HashReader`] that fetches tiles of a fixed height `H` on
/// demand, in parallel within a batch, with partial-tile fallback.
pub struct TileReader<F: TileFetcher> {
    height: u8,
    fetcher: F,
    cache: Mutex<LruCache<Tile, Arc<Vec<u8>>>>,
    save_hook: Option<Box<dyn SaveTiles>>,
}

impl<F: TileFetcher> TileReader<F> {
    /// Build a reader with the default tile-cache capacity.
    pub fn new(height: u8, fetcher: F) -> Self {
        Self::with_capacity(height, fetcher, DEFAULT_CACHE_CAPACITY)
    }

    /// Build a reader whose in-memory tile cache holds at most `capacity`
    /// tiles, evicting least-recently-used entries once full. Tiles are
    /// immutable once inserted (spec.md §4.4), so eviction only affects
    /// how often a tile is re-fetched, never correctness.
    pub fn with_capacity(height: u8, fetcher: F, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).expect("nonzero"));
        Self {
            height,
            fetcher,
            cache: Mutex::new(LruCache::new(capacity)),
            save_hook: None,
        }
    }

    pub fn with_save_hook(mut self, hook: Box<dyn SaveTiles>) -> Self {
        self.save_hook = Some(hook);
        self
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    fn cached(&self, tile: &Tile) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().expect("tile cache poisoned").get(tile).cloned()
    }

    fn insert(&self, tile: Tile, data: Arc<Vec<u8>>) {
        self.cache.lock().expect("tile cache poisoned").put(tile, data);
    }

    /// Fetch one tile, applying the partial-tile fallback: if fetching a
    /// partial tile fails, retry at full width and truncate.
    fn fetch_one(&self, tile: Tile) -> Result<Arc<Vec<u8>>, MerkleError> {
        if let Some(cached) = self.cached(&tile) {
            return Ok(cached);
        }
        tracing::debug!(tile = %tile.path(), "fetching tile");
        let result = self.fetcher.fetch_tile(&tile);
        let data = match result {
            Ok(bytes) => bytes,
            Err(first_err) => {
                if tile.is_full() {
                    return Err(first_err);
                }
                tracing::debug!(
                    tile = %tile.path(),
                    error = %first_err,
                    "partial tile fetch failed, retrying at full width"
                );
                let full = Tile {
                    w: Tile::full_width(tile.h),
                    ..tile
                };
                let mut bytes = self.fetcher.fetch_tile(&full)?;
                bytes.truncate(tile.byte_len());
                bytes
            }
        };
        if data.len() < tile.byte_len() {
            return Err(MerkleError::TileError(format!(
                "tile {} returned {} bytes, want at least {}",
                tile.path(),
                data.len(),
                tile.byte_len()
            )));
        }
        let data = Arc::new(data);
        self.insert(tile, data.clone());
        Ok(data)
    }
}

impl<F: TileFetcher> HashReader for TileReader<F> {
    fn read_hashes(&self, indexes: &[u64]) -> Result<Vec<Hash>, MerkleError> {
        let wants: Vec<(Tile, usize)> = indexes
            .iter()
            .map(|&i| {
                let (tile, _, _) = tile_for_index(self.height, i);
                (tile, i as usize)
            })
            .collect();

        let mut distinct: Vec<Tile> = wants.iter().map(|(t, _)| *t).collect();
        distinct.sort_by_key(|t| (t.l, t.n, t.w));
        distinct.dedup();

        let fetched: Vec<(Tile, Result<Arc<Vec<u8>>, MerkleError>)> = distinct
            .par_iter()
            .map(|tile| (*tile, self.fetch_one(*tile)))
            .collect();

        let mut by_tile: HashMap<Tile, Arc<Vec<u8>>> = HashMap::new();
        let mut fresh_tiles = Vec::new();
        let mut fresh_data = Vec::new();
        for (tile, result) in fetched {
            let data = result?;
            fresh_tiles.push(tile);
            fresh_data.push((*data).clone());
            by_tile.insert(tile, data);
        }
        if let Some(hook) = &self.save_hook {
            if !fresh_tiles.is_empty() {
                hook.save_tiles(&fresh_tiles, &fresh_data);
            }
        }

        indexes
            .iter()
            .map(|&i| {
                let (tile, _, _) = tile_for_index(self.height, i);
                let data = by_tile
                    .get(&tile)
                    .ok_or_else(|| MerkleError::ReaderError("tile fetch dropped".into()))?;
                hash_from_tile(self.height, tile, data, i)
            })
            .collect()
    }
}
