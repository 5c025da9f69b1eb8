//! Merkle log algebra, tile codec and tile reader.
//!
//! This crate has no I/O of its own: the server side supplies a
//! [`HashReader`] backed by its own storage (see [`MemoryHashReader`] for
//! tests), and the client side supplies one backed by a [`TileReader`]
//! fetching over HTTP.

pub mod errors;
pub mod index;
pub mod reader;
pub mod tile;
pub mod tile_reader;
pub mod tree;

pub use errors::MerkleError;
pub use index::{split_stored_hash_index, stored_hash_count, stored_hash_index};
pub use reader::{HashReader, MemoryHashReader};
pub use tile::{hash_from_tile, new_tiles, tile_for_index, Tile};
pub use tile_reader::{TileFetcher, TileReader};
pub use tree::{check_record, check_tree, prove_record, prove_tree, stored_hashes_for_append, tree_hash};
