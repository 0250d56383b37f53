use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anvil_chunk::{AxisOrder, Chunk, DISK_ORDER};
use anvil_common::{ChunkPos, chunk_hash};
use anvil_export::{ChunkExporter, ExportMode, ExportSink, InlineScheduler, TaskScheduler, WorkerPool};
use anvil_format::{
    ChunkCodec, PROVIDER_NAME, RegionDirectory, RegionFileOpener, RegionHandle, is_valid,
};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::level_dat::{self, LevelInfo};

/// Blocks per column.
pub const WORLD_HEIGHT: u32 = 256;

const LEVEL_DAT: &str = "level.dat";
const REGION_DIR: &str = "region";

/// An open Anvil world: its regions, loaded chunks and export path.
pub struct AnvilProvider {
    path: PathBuf,
    config: ProviderConfig,
    codec: ChunkCodec,
    regions: RegionDirectory<RegionFileOpener>,
    chunks: HashMap<i64, Chunk>,
    exporter: ChunkExporter,
}

impl AnvilProvider {
    /// Open an existing world directory.
    pub fn open(path: impl AsRef<Path>, config: ProviderConfig) -> Result<Self, ProviderError> {
        let path = path.as_ref().to_path_buf();
        if !is_valid(&path) {
            return Err(ProviderError::InvalidWorld(path));
        }

        let scheduler: Box<dyn TaskScheduler> = match config.export_mode() {
            ExportMode::Async => Box::new(WorkerPool::new(config.export_workers)?),
            ExportMode::Sync => Box::new(InlineScheduler),
        };
        tracing::info!(path = %path.display(), mode = ?config.export_mode(), "opened world");

        Ok(Self {
            codec: ChunkCodec::new(config.compression_level),
            regions: RegionDirectory::new(RegionFileOpener::new(path.join(REGION_DIR))),
            chunks: HashMap::new(),
            exporter: ChunkExporter::new(config.export_mode(), scheduler),
            config,
            path,
        })
    }

    /// Lay out a new world at `path` and open it.
    pub fn create(
        path: impl AsRef<Path>,
        info: &LevelInfo,
        config: ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path.join(REGION_DIR))?;
        level_dat::write(path.join(LEVEL_DAT), info)?;
        tracing::info!(path = %path.display(), name = %info.name, "created world");
        Self::open(path, config)
    }

    pub fn provider_name() -> &'static str {
        PROVIDER_NAME
    }

    pub fn disk_order() -> AxisOrder {
        DISK_ORDER
    }

    pub fn world_height() -> u32 {
        WORLD_HEIGHT
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn level_info(&self) -> Result<LevelInfo, ProviderError> {
        level_dat::read(self.path.join(LEVEL_DAT))
    }

    /// Loaded chunk at `(x, z)`; never touches disk.
    pub fn chunk(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.chunks.get(&chunk_hash(x, z))
    }

    pub fn chunk_mut(&mut self, x: i32, z: i32) -> Option<&mut Chunk> {
        self.chunks.get_mut(&chunk_hash(x, z))
    }

    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn open_regions(&self) -> usize {
        self.regions.len()
    }

    /// Chunk at `(x, z)`, read from its region on first access.
    ///
    /// `Ok(None)` if the region has no such chunk or its document does not
    /// decode; the latter is logged.
    pub fn load_chunk(&mut self, x: i32, z: i32) -> Result<Option<&Chunk>, ProviderError> {
        let key = chunk_hash(x, z);
        if self.chunks.contains_key(&key) {
            return Ok(self.chunks.get(&key));
        }

        let (lx, lz) = ChunkPos::new(x, z).local();
        let region = self.regions.load_region(x, z)?;
        let Some(bytes) = region.read_chunk(lx, lz)? else {
            return Ok(None);
        };

        let chunk = match self.codec.deserialize(&bytes) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(x, z, "could not decode chunk: {e}");
                return Ok(None);
            }
        };
        if chunk.pos() != ChunkPos::new(x, z) {
            tracing::warn!(
                x,
                z,
                stored_x = chunk.x(),
                stored_z = chunk.z(),
                "chunk document is for another position"
            );
            return Ok(None);
        }

        tracing::debug!(x, z, "loaded chunk");
        self.chunks.insert(key, chunk);
        Ok(self.chunks.get(&key))
    }

    /// Put `chunk` in the cache, replacing whatever was loaded at its
    /// position. Nothing is written until the chunk is saved.
    pub fn set_chunk(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.pos().hash(), chunk)
    }

    /// Write the loaded chunk at `(x, z)` to its region. Returns `false` if
    /// it is not loaded.
    pub fn save_chunk(&mut self, x: i32, z: i32) -> Result<bool, ProviderError> {
        let Some(chunk) = self.chunks.get(&chunk_hash(x, z)) else {
            return Ok(false);
        };
        write_chunk(&self.codec, &mut self.regions, chunk)?;
        Ok(true)
    }

    /// Write every loaded chunk. Returns how many were written.
    pub fn save_all(&mut self) -> Result<usize, ProviderError> {
        let _span = tracing::info_span!("save_all", chunks = self.chunks.len()).entered();
        for chunk in self.chunks.values() {
            write_chunk(&self.codec, &mut self.regions, chunk)?;
        }
        tracing::debug!(regions = self.regions.len(), "saved chunks");
        Ok(self.chunks.len())
    }

    /// Drop chunk `(x, z)` from the cache, saving it first if asked.
    pub fn unload_chunk(&mut self, x: i32, z: i32, save: bool) -> Result<bool, ProviderError> {
        if save {
            self.save_chunk(x, z)?;
        }
        Ok(self.chunks.remove(&chunk_hash(x, z)).is_some())
    }

    /// Export chunk `(x, z)` to `sink`, loading it first if needed.
    ///
    /// In async mode the payload arrives through [`poll_exports`].
    ///
    /// [`poll_exports`]: Self::poll_exports
    pub fn request_chunk<K: ExportSink + ?Sized>(
        &mut self,
        x: i32,
        z: i32,
        sink: &mut K,
    ) -> Result<(), ProviderError> {
        self.load_chunk(x, z)?;
        self.exporter.request_export(&self.chunks, x, z, sink)?;
        Ok(())
    }

    /// Deliver finished async exports without blocking.
    pub fn poll_exports<K: ExportSink + ?Sized>(&mut self, sink: &mut K) -> usize {
        self.exporter.poll(sink)
    }

    /// Block until every pending export has been delivered.
    pub fn wait_exports<K: ExportSink + ?Sized>(&mut self, sink: &mut K) -> usize {
        self.exporter.wait_all(sink)
    }

    pub fn pending_exports(&self) -> usize {
        self.exporter.in_flight()
    }

    /// Close every open region file. Loaded chunks stay cached.
    pub fn close(&mut self) -> Result<(), ProviderError> {
        self.regions.close_all()?;
        Ok(())
    }
}

fn write_chunk(
    codec: &ChunkCodec,
    regions: &mut RegionDirectory<RegionFileOpener>,
    chunk: &Chunk,
) -> Result<(), ProviderError> {
    let bytes = codec.serialize(chunk)?;
    let (lx, lz) = chunk.pos().local();
    regions
        .load_region(chunk.x(), chunk.z())?
        .write_chunk(lx, lz, &bytes)?;
    tracing::trace!(x = chunk.x(), z = chunk.z(), bytes = bytes.len(), "wrote chunk");
    Ok(())
}

impl std::fmt::Debug for AnvilProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnvilProvider")
            .field("path", &self.path)
            .field("chunks", &self.chunks.len())
            .field("regions", &self.regions.len())
            .field("exporter", &self.exporter)
            .finish()
    }
}
