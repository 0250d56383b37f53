use std::path::PathBuf;

use anvil_export::ChunkError;
use anvil_format::{FormatError, StorageError};

/// Errors from opening, creating or driving a world.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("not an anvil world: {}", .0.display())]
    InvalidWorld(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("level.dat: {0}")]
    LevelData(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
}
