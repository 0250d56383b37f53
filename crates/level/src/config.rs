use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anvil_export::ExportMode;
use anvil_format::DEFAULT_COMPRESSION_LEVEL;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Provider settings, usually read from a JSON file. Missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// zlib level for chunk documents, `0..=9`.
    pub compression_level: u32,
    /// Package chunk requests on worker threads instead of inline.
    pub async_chunk_request: bool,
    pub export_workers: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            async_chunk_request: true,
            export_workers: 2,
        }
    }
}

impl ProviderConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn export_mode(&self) -> ExportMode {
        ExportMode::from_async_flag(self.async_chunk_request)
    }
}
