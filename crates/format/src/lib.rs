//! Anvil storage format: chunk documents, region files and world probing.
//!
//! # Invariants
//! - Stored sections are YZX ordered; decoded chunks are XZY ordered.
//! - Only non-empty sections are written, each with its own `Y`.
//! - Exactly one open handle per region key.
//! - Decoding never panics on malformed input; it returns [`FormatError`].

pub mod codec;
pub mod directory;
pub mod error;
pub mod region;
mod schema;
pub mod validate;

pub use codec::{ChunkCodec, DEFAULT_COMPRESSION_LEVEL, FORMAT_VERSION, MAX_DOCUMENT_BYTES};
pub use directory::{RegionDirectory, RegionHandle, RegionOpener};
pub use error::{FormatError, StorageError};
pub use region::{RegionFile, RegionFileOpener};
pub use validate::is_valid;

/// Name this storage format registers under.
pub const PROVIDER_NAME: &str = "anvil";
