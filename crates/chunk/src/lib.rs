//! Chunk model: 16x16 columns split into 16x16x16 sections.
//!
//! # Invariants
//! - In-memory block arrays are always XZY ordered (`x << 8 | z << 4 | y`).
//! - A chunk always has [`SECTION_COUNT`] section slots; slot index == section Y.
//! - Snapshots are plain data; producing them is the simulation's job.

pub mod chunk;
pub mod reorder;
pub mod section;
pub mod snapshot;

pub use chunk::{BIOME_COLOR_LEN, Chunk, HEIGHT_MAP_LEN, SECTION_COUNT};
pub use reorder::{AxisOrder, DISK_ORDER, MEMORY_ORDER};
pub use section::{BLOCKS_PER_SECTION, NIBBLES_PER_SECTION, SubChunk};
pub use snapshot::{EntitySnapshot, Persistence, TileSnapshot};
