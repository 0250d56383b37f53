//! Shared coordinate types for the anvil chunk store.

mod types;

pub use types::{ChunkPos, RegionPos, REGION_SHIFT, REGION_WIDTH, chunk_hash, region_hash};
