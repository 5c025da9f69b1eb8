//! # Tile codec
//!
//! A tile is a rectangular block of `W` consecutive stored hashes at
//! absolute level `H * L`, starting at offset `N * 2^H`. Spec.md §4.3.
//!
//! Any node of the tree, at any level, can be derived from the raw bytes
//! of the tile whose bottom row covers it, by recursively halving and
//! combining with [`notary_hash::hash_node`] ([`hash_from_tile`]).

use notary_hash::{hash_node, Hash};

use crate::errors::MerkleError;
use crate::index::split_stored_hash_index;

/// A rectangular block of hashes, addressable by `(H, L, N, W)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub h: u8,
    pub l: u8,
    pub n: u64,
    pub w: u32,
}

impl Tile {
    /// Width of a full tile of height `h`.
    pub fn full_width(h: u8) -> u32 {
        1u32 << h
    }

    /// Whether this tile is full (immutable once written).
    pub fn is_full(&self) -> bool {
        self.w == Self::full_width(self.h)
    }

    /// Number of bytes this tile's raw data occupies.
    pub fn byte_len(&self) -> usize {
        self.w as usize * 32
    }

    /// Encode the tile address as a storage path.
    pub fn path(&self) -> String {
        let groups = encode_n_groups(self.n);
        let mut p = format!("tile/{}/{}/{}", self.h, self.l, groups.join("/"));
        if self.w != Self::full_width(self.h) {
            p.push_str(&format!(".p/{}", self.w));
        }
        p
    }

    /// Parse a tile path, rejecting anything that does not round-trip.
    pub fn parse_path(path: &str) -> Result<Tile, MerkleError> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() < 4 || parts[0] != "tile" {
            return Err(MerkleError::TileError(format!("not a tile path: {path}")));
        }
        let h: u8 = parts[1]
            .parse()
            .map_err(|_| MerkleError::TileError(format!("bad height in {path}")))?;
        if !(1..=30).contains(&h) {
            return Err(MerkleError::TileError(format!("height out of range in {path}")));
        }
        let l: u8 = parts[2]
            .parse()
            .map_err(|_| MerkleError::TileError(format!("bad level in {path}")))?;

        let mut rest = &parts[3..];
        let (w, final_group): (u32, &str) = if rest.len() >= 2
            && rest[rest.len() - 2].ends_with(".p")
        {
            let w: u32 = rest[rest.len() - 1]
                .parse()
                .map_err(|_| MerkleError::TileError(format!("bad width in {path}")))?;
            let base = rest[rest.len() - 2]
                .strip_suffix(".p")
                .expect("checked above");
            rest = &rest[..rest.len() - 2];
            (w, base)
        } else if let Some((&last, init)) = rest.split_last() {
            rest = init;
            (Self::full_width(h), last)
        } else {
            return Err(MerkleError::TileError(format!("empty tile path: {path}")));
        };

        if final_group.len() != 3 || !final_group.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MerkleError::TileError(format!(
                "malformed final group in {path}"
            )));
        }
        let final_digits: u64 = final_group
            .parse()
            .map_err(|_| MerkleError::TileError(format!("bad N in {path}")))?;

        let mut n: u64 = 0;
        for g in rest {
            if g.len() != 4 || !g.starts_with('x') || !g[1..].bytes().all(|b| b.is_ascii_digit()) {
                return Err(MerkleError::TileError(format!("malformed group in {path}")));
            }
            let v: u64 = g[1..]
                .parse()
                .map_err(|_| MerkleError::TileError(format!("bad group in {path}")))?;
            n = n * 1000 + v;
        }
        n = n * 1000 + final_digits;

        let tile = Tile { h, l, n, w };
        if tile.path() != path {
            return Err(MerkleError::TileError(format!(
                "tile path did not round-trip: {path}"
            )));
        }
        Ok(tile)
    }
}

fn encode_n_groups(n: u64) -> Vec<String> {
    let mut groups = vec![format!("{:03}", n % 1000)];
    let mut rest = n / 1000;
    while rest > 0 {
        groups.push(format!("x{:03}", rest % 1000));
        rest /= 1000;
    }
    groups.reverse();
    groups
}

/// Find the minimum-width tile containing stored index `i`, at height `h`,
/// plus the byte range of `i`'s hash within that tile. Spec.md §4.3.1.
pub fn tile_for_index(h: u8, i: u64) -> (Tile, usize, usize) {
    let (level, n) = split_stored_hash_index(i);
    let l = level / h;
    let within = level - l * h;
    let n_abs = n << within;
    let tile_n = n_abs >> h;
    let w_start = n_abs - (tile_n << h);
    let span = 1u64 << within;
    let w_end = w_start + span;
    let tile = Tile {
        h,
        l,
        n: tile_n,
        w: w_end as u32,
    };
    (tile, w_start as usize * 32, w_end as usize * 32)
}

/// Recursively halve `data` and combine halves via [`hash_node`], down to a
/// single hash. `data.len()` must be a power-of-two multiple of 32 bytes.
fn tile_hash(data: &[u8]) -> Hash {
    if data.len() == 32 {
        let mut h = [0u8; 32];
        h.copy_from_slice(data);
        return h;
    }
    let mid = data.len() / 2;
    let left = tile_hash(&data[..mid]);
    let right = tile_hash(&data[mid..]);
    hash_node(&left, &right)
}

/// Derive the hash at stored index `i` from a tile's raw bytes.
/// Spec.md §4.3.2.
pub fn hash_from_tile(h: u8, tile: Tile, data: &[u8], i: u64) -> Result<Hash, MerkleError> {
    let (want, start, end) = tile_for_index(h, i);
    if want.l != tile.l || want.n != tile.n || want.h != tile.h {
        return Err(MerkleError::TileError(format!(
            "tile ({},{},{}) does not contain index {i}",
            tile.h, tile.l, tile.n
        )));
    }
    if (tile.w as usize) < want.w as usize {
        return Err(MerkleError::TileError(format!(
            "tile width {} smaller than required {}",
            tile.w, want.w
        )));
    }
    if data.len() < end {
        return Err(MerkleError::TileError(
            "tile data shorter than its declared width".into(),
        ));
    }
    Ok(tile_hash(&data[start..end]))
}

/// Tiles that must be published when the tree grows from `old_t` to
/// `new_t` leaves, at height `h`. Spec.md §4.3.3.
pub fn new_tiles(h: u8, old_t: u64, new_t: u64) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let full_w = Tile::full_width(h) as u64;
    let mut level = 0u32;
    loop {
        let shift = h as u32 * level;
        if shift >= 64 {
            break;
        }
        let new_row = new_t >> shift;
        if new_row == 0 {
            break;
        }
        let old_row = if (h as u32) * level < 64 {
            old_t >> shift
        } else {
            0
        };

        let old_full = old_row / full_w;
        let new_full = new_row / full_w;
        for n in old_full..new_full {
            tiles.push(Tile {
                h,
                l: level as u8,
                n,
                w: full_w as u32,
            });
        }

        let cur_n = new_full;
        let new_w = new_row - cur_n * full_w;
        if new_w > 0 {
            let min_w = if old_row / full_w == cur_n {
                (old_row - cur_n * full_w) + 1
            } else {
                1
            };
            for w in min_w..=new_w {
                tiles.push(Tile {
                    h,
                    l: level as u8,
                    n: cur_n,
                    w: w as u32,
                });
            }
        }

        level += 1;
    }
    tiles
}
