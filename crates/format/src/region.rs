//! File-backed region storage (`r.<x>.<z>.mca`).
//!
//! Layout:
//! ```text
//! 0x0000  1024 x u32 BE   location: sector offset << 8 | sector count
//! 0x1000  1024 x u32 BE   last-write timestamp (unix seconds)
//! 0x2000  4 KiB sectors   u32 BE length, u8 compression, payload
//! ```
//! Entry index is `local_x + local_z * 32`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anvil_common::RegionPos;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::directory::{RegionHandle, RegionOpener};
use crate::error::StorageError;

/// Chunks per region.
const REGION_CHUNKS: usize = 1024;
/// Bytes per sector.
const SECTOR_BYTES: u64 = 4096;
/// Location table plus timestamp table.
const HEADER_SECTORS: u32 = 2;
/// Chunk length prefix plus compression byte.
const CHUNK_HEADER_BYTES: usize = 5;
/// Compression byte for zlib payloads.
const COMPRESSION_ZLIB: u8 = 2;

/// Where one chunk lives inside the region file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Location {
    sector: u32,
    count: u8,
}

impl Location {
    fn from_raw(raw: u32) -> Self {
        Self {
            sector: raw >> 8,
            count: (raw & 0xff) as u8,
        }
    }

    fn to_raw(self) -> u32 {
        (self.sector << 8) | self.count as u32
    }

    fn is_empty(self) -> bool {
        self.count == 0
    }
}

/// One open region file.
pub struct RegionFile {
    pos: RegionPos,
    path: PathBuf,
    file: File,
    locations: Vec<Location>,
    timestamps: Vec<u32>,
}

impl RegionFile {
    /// Open or create the region file at `path`.
    pub fn open(path: impl AsRef<Path>, pos: RegionPos) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let header_len = HEADER_SECTORS as u64 * SECTOR_BYTES;
        if file.metadata()?.len() < header_len {
            file.set_len(header_len)?;
        }

        file.seek(SeekFrom::Start(0))?;
        let mut locations = Vec::with_capacity(REGION_CHUNKS);
        for index in 0..REGION_CHUNKS {
            let location = Location::from_raw(file.read_u32::<BigEndian>()?);
            if !location.is_empty() && location.sector < HEADER_SECTORS {
                return Err(StorageError::CorruptHeader {
                    index,
                    sector: location.sector,
                });
            }
            locations.push(location);
        }
        let mut timestamps = Vec::with_capacity(REGION_CHUNKS);
        for _ in 0..REGION_CHUNKS {
            timestamps.push(file.read_u32::<BigEndian>()?);
        }

        Ok(Self {
            pos,
            path,
            file,
            locations,
            timestamps,
        })
    }

    pub fn pos(&self) -> RegionPos {
        self.pos
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of chunks stored in this region.
    pub fn chunk_count(&self) -> usize {
        self.locations.iter().filter(|l| !l.is_empty()).count()
    }

    /// Whether the chunk at local `(x, z)` has stored data.
    pub fn has_chunk(&self, x: u8, z: u8) -> bool {
        !self.locations[entry_index(x, z)].is_empty()
    }

    /// Last write time of the chunk at local `(x, z)`, unix seconds.
    pub fn timestamp(&self, x: u8, z: u8) -> u32 {
        self.timestamps[entry_index(x, z)]
    }

    fn read(&mut self, x: u8, z: u8) -> Result<Option<Vec<u8>>, StorageError> {
        let location = self.locations[entry_index(x, z)];
        if location.is_empty() {
            return Ok(None);
        }

        self.file
            .seek(SeekFrom::Start(location.sector as u64 * SECTOR_BYTES))?;
        let length = self.file.read_u32::<BigEndian>()?;
        let capacity = location.count as u64 * SECTOR_BYTES - 4;
        if length == 0 || length as u64 > capacity {
            return Err(StorageError::CorruptChunk {
                x,
                z,
                length,
                sectors: location.count,
            });
        }

        let compression = self.file.read_u8()?;
        if compression != COMPRESSION_ZLIB {
            return Err(StorageError::UnsupportedCompression(compression));
        }

        let mut payload = vec![0u8; length as usize - 1];
        self.file.read_exact(&mut payload)?;
        Ok(Some(payload))
    }

    fn write(&mut self, x: u8, z: u8, payload: &[u8]) -> Result<(), StorageError> {
        let index = entry_index(x, z);
        let total = payload.len() + CHUNK_HEADER_BYTES;
        let sectors = total.div_ceil(SECTOR_BYTES as usize);
        if sectors > u8::MAX as usize {
            return Err(StorageError::ChunkTooLarge { sectors });
        }

        let current = self.locations[index];
        let sector = if !current.is_empty() && current.count as usize >= sectors {
            current.sector
        } else {
            self.allocate(index, sectors)?
        };

        self.file.seek(SeekFrom::Start(sector as u64 * SECTOR_BYTES))?;
        let mut buf = Vec::with_capacity(sectors * SECTOR_BYTES as usize);
        buf.write_u32::<BigEndian>(payload.len() as u32 + 1)?;
        buf.write_u8(COMPRESSION_ZLIB)?;
        buf.extend_from_slice(payload);
        buf.resize(sectors * SECTOR_BYTES as usize, 0);
        self.file.write_all(&buf)?;

        let location = Location {
            sector,
            count: sectors as u8,
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        self.locations[index] = location;
        self.timestamps[index] = timestamp;

        self.file.seek(SeekFrom::Start(index as u64 * 4))?;
        self.file.write_u32::<BigEndian>(location.to_raw())?;
        self.file
            .seek(SeekFrom::Start(SECTOR_BYTES + index as u64 * 4))?;
        self.file.write_u32::<BigEndian>(timestamp)?;
        Ok(())
    }

    /// Start of the first run of `count` free sectors. Space held by entry
    /// `index` counts as free; it is about to be rewritten. Appends past the
    /// end when no gap is large enough.
    fn allocate(&self, index: usize, count: usize) -> Result<u32, StorageError> {
        let end = self.end_sector()?;
        let mut used = vec![false; end as usize];
        used[..HEADER_SECTORS as usize].fill(true);
        for (i, location) in self.locations.iter().enumerate() {
            if i == index || location.is_empty() {
                continue;
            }
            let start = (location.sector as usize).min(used.len());
            let stop = (start + location.count as usize).min(used.len());
            used[start..stop].fill(true);
        }

        let mut run = 0;
        for (sector, &taken) in used.iter().enumerate() {
            if taken {
                run = 0;
                continue;
            }
            run += 1;
            if run == count {
                return Ok((sector + 1 - count) as u32);
            }
        }
        Ok(end)
    }

    /// First sector past the end of the file.
    fn end_sector(&self) -> Result<u32, StorageError> {
        let len = self.file.metadata()?.len();
        Ok((len.div_ceil(SECTOR_BYTES) as u32).max(HEADER_SECTORS))
    }
}

impl RegionHandle for RegionFile {
    fn read_chunk(&mut self, x: u8, z: u8) -> Result<Option<Vec<u8>>, StorageError> {
        self.read(x, z)
    }

    fn write_chunk(&mut self, x: u8, z: u8, payload: &[u8]) -> Result<(), StorageError> {
        self.write(x, z, payload)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

/// Opens region files from a world's `region/` directory.
#[derive(Debug, Clone)]
pub struct RegionFileOpener {
    dir: PathBuf,
}

impl RegionFileOpener {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RegionOpener for RegionFileOpener {
    type Region = RegionFile;

    fn open(&self, pos: RegionPos) -> Result<RegionFile, StorageError> {
        RegionFile::open(self.dir.join(pos.file_name()), pos)
    }
}

fn entry_index(x: u8, z: u8) -> usize {
    debug_assert!(x < 32 && z < 32, "local chunk ({x}, {z}) outside region");
    x as usize + z as usize * 32
}
